//! # Changelog Parameters
//!
//! The parameter store holds `name = value` definitions collected from the
//! resolution settings and from `property` nodes while documents are loaded.
//! Before a node is interpreted, every `${name}` placeholder in it is
//! replaced with the value visible from the document being loaded.
//!
//! ## Visibility rules
//!
//! - Names are case-insensitive and the first applicable definition wins.
//! - A definition applies when its dbms set matches the runtime database,
//!   its context expression matches the runtime contexts and the runtime
//!   label filter matches its labels.
//! - A non-global definition is only visible to the document that made it.
//! - Placeholders with no visible definition are left in place.

use crate::filter::{dbms_matches, dbms_set, ContextExpression, Labels, RuntimeEnvironment};
use crate::node::ParsedNode;
use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Built-in parameter holding the target database short name.
pub const DATABASE_TYPE_PARAMETER: &str = "database.typeName";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"));

/// Applicability filters attached to a parameter definition.
#[derive(Debug, Clone)]
pub struct ParameterScope {
    pub contexts: ContextExpression,
    pub labels: Labels,
    pub dbms: BTreeSet<String>,
    pub global: bool,
}

impl ParameterScope {
    /// Unfiltered, globally visible scope.
    pub fn global() -> Self {
        Self {
            contexts: ContextExpression::default(),
            labels: Labels::default(),
            dbms: BTreeSet::new(),
            global: true,
        }
    }

    /// Scope from the raw attribute values of a `property` node. `global`
    /// defaults to true when unspecified.
    pub fn from_attributes(
        context: Option<&str>,
        labels: Option<&str>,
        dbms: Option<&str>,
        global: Option<bool>,
    ) -> Self {
        Self {
            contexts: ContextExpression::new(context),
            labels: Labels::new(labels),
            dbms: dbms_set(dbms),
            global: global.unwrap_or(true),
        }
    }
}

impl Default for ParameterScope {
    fn default() -> Self {
        Self::global()
    }
}

/// A single parameter definition.
#[derive(Debug, Clone)]
pub struct ChangelogParameter {
    pub name: String,
    pub value: String,
    pub scope: ParameterScope,
    /// File path of the defining document, `None` for settings-level
    /// definitions.
    pub defined_in: Option<String>,
}

/// Parameter store for one resolution.
#[derive(Debug, Clone, Default)]
pub struct ChangelogParameters {
    runtime: RuntimeEnvironment,
    entries: Vec<ChangelogParameter>,
}

impl ChangelogParameters {
    /// Create a store for a runtime, seeding the built-in parameters.
    pub fn new(runtime: RuntimeEnvironment) -> Self {
        let mut parameters = Self {
            runtime,
            entries: Vec::new(),
        };
        if let Some(database_type) = parameters.runtime.database_type.clone() {
            parameters.set_global(DATABASE_TYPE_PARAMETER, &database_type);
        }
        parameters
    }

    pub fn runtime(&self) -> &RuntimeEnvironment {
        &self.runtime
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ChangelogParameter] {
        &self.entries
    }

    /// Define an unfiltered global parameter.
    pub fn set_global(&mut self, name: &str, value: &str) {
        self.set(name, value, ParameterScope::global(), None);
    }

    /// Define a parameter from a document (or from settings when
    /// `changelog` is `None`).
    pub fn set(&mut self, name: &str, value: &str, scope: ParameterScope, changelog: Option<&str>) {
        self.entries.push(ChangelogParameter {
            name: name.to_string(),
            value: value.to_string(),
            scope,
            defined_in: changelog.map(str::to_string),
        });
    }

    fn applies(&self, parameter: &ChangelogParameter) -> bool {
        let dbms_ok = match &self.runtime.database_type {
            Some(database) => dbms_matches(&parameter.scope.dbms, database, true),
            None => true,
        };
        dbms_ok
            && parameter.scope.contexts.matches(&self.runtime.contexts)
            && self.runtime.label_filter.matches(&parameter.scope.labels)
    }

    fn visible_from(parameter: &ChangelogParameter, changelog: Option<&str>) -> bool {
        parameter.scope.global
            || parameter.defined_in.is_none()
            || parameter.defined_in.as_deref() == changelog
    }

    /// Value of `name` as seen from the document with file path `changelog`.
    pub fn value(&self, name: &str, changelog: Option<&str>) -> Option<&str> {
        self.entries
            .iter()
            .filter(|parameter| parameter.name.eq_ignore_ascii_case(name))
            .filter(|parameter| Self::visible_from(parameter, changelog))
            .find(|parameter| self.applies(parameter))
            .map(|parameter| parameter.value.as_str())
    }

    /// Whether a parameter named `name` is visible from `changelog`.
    pub fn has_value(&self, name: &str, changelog: Option<&str>) -> bool {
        self.value(name, changelog).is_some()
    }

    /// Target database short name as seen from `changelog`.
    pub fn database_type(&self, changelog: Option<&str>) -> Option<&str> {
        self.value(DATABASE_TYPE_PARAMETER, changelog)
    }

    /// Replace every `${name}` with its visible value. Unknown names are
    /// left untouched.
    pub fn expand(&self, text: &str, changelog: Option<&str>) -> String {
        if !text.contains("${") {
            return text.to_string();
        }
        PLACEHOLDER
            .replace_all(text, |caps: &Captures| {
                match self.value(caps[1].trim(), changelog) {
                    Some(value) => value.to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Expand the value of `node` and of every descendant in place.
    pub fn expand_node(&self, node: &mut ParsedNode, changelog: Option<&str>) {
        let expanded = node.value().map(|value| self.expand(value, changelog));
        if expanded.is_some() {
            node.set_value(expanded);
        }
        for child in node.children_mut() {
            self.expand_node(child, changelog);
        }
    }
}
