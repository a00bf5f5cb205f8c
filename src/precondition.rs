//! # Precondition Trees
//!
//! Preconditions gate execution of a document or changeset. This crate only
//! models and composes them; evaluating a precondition against a database
//! is the execution subsystem's job.
//!
//! A `PreconditionContainer` carries its own failure policies and a list of
//! nested preconditions, which may be logical groups, leaf checks, or whole
//! containers. Every document owns a `ChangelogPreconditions` root that
//! collects its own `preConditions` blocks plus the root of every document it
//! includes. That root always reports the `TEST` sql-output policy because
//! it aggregates containers from unrelated documents.
//!
//! Merging is by value: `merged` consumes the parent and the child and
//! returns the composed tree, so a child tree cannot end up shared between
//! two parents.

use crate::error::{Error, Result};
use crate::node::ParsedNode;
use std::collections::BTreeMap;
use std::str::FromStr;

/// What to do when a precondition fails (or errors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    Halt,
    Continue,
    MarkRan,
    Warn,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HALT" => Ok(FailurePolicy::Halt),
            "CONTINUE" => Ok(FailurePolicy::Continue),
            "MARK_RAN" => Ok(FailurePolicy::MarkRan),
            "WARN" => Ok(FailurePolicy::Warn),
            other => Err(format!("unknown failure policy '{}'", other)),
        }
    }
}

/// How a precondition behaves when only generating SQL output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlOutputPolicy {
    #[default]
    Ignore,
    Test,
    Fail,
}

impl FromStr for SqlOutputPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IGNORE" => Ok(SqlOutputPolicy::Ignore),
            "TEST" => Ok(SqlOutputPolicy::Test),
            "FAIL" => Ok(SqlOutputPolicy::Fail),
            other => Err(format!("unknown sql output policy '{}'", other)),
        }
    }
}

/// A node of a precondition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    And(Vec<Precondition>),
    Or(Vec<Precondition>),
    Not(Vec<Precondition>),
    /// A nested container with its own policies.
    Container(PreconditionContainer),
    /// A leaf check such as `tableExists`, with its attributes.
    Check {
        name: String,
        params: BTreeMap<String, String>,
    },
}

impl Precondition {
    fn load(node: &ParsedNode) -> Result<Self> {
        match node.name() {
            "and" => Ok(Precondition::And(load_nested(node)?)),
            "or" => Ok(Precondition::Or(load_nested(node)?)),
            "not" => Ok(Precondition::Not(load_nested(node)?)),
            "preConditions" => Ok(Precondition::Container(PreconditionContainer::load(node)?)),
            name => {
                let mut params = BTreeMap::new();
                for child in node.children() {
                    if let Some(value) = child.value() {
                        params.insert(child.name().to_string(), value.to_string());
                    }
                }
                if let Some(value) = node.value() {
                    params.insert("value".to_string(), value.to_string());
                }
                Ok(Precondition::Check {
                    name: name.to_string(),
                    params,
                })
            }
        }
    }
}

fn load_nested(node: &ParsedNode) -> Result<Vec<Precondition>> {
    node.children().iter().map(Precondition::load).collect()
}

const CONTAINER_ATTRIBUTES: &[&str] = &[
    "onFail",
    "onError",
    "onSqlOutput",
    "onFailMessage",
    "onErrorMessage",
];

fn policy_attr<T>(node: &ParsedNode, attribute: &str) -> Result<Option<T>>
where
    T: FromStr<Err = String>,
{
    match node.child_str(attribute) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|message| Error::InvalidAttribute {
                node: node.name().to_string(),
                attribute: attribute.to_string(),
                message,
            }),
    }
}

/// A `preConditions` block: policies plus nested preconditions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreconditionContainer {
    pub on_fail: FailurePolicy,
    pub on_error: FailurePolicy,
    pub on_sql_output: SqlOutputPolicy,
    pub on_fail_message: Option<String>,
    pub on_error_message: Option<String>,
    pub nested: Vec<Precondition>,
}

impl PreconditionContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `preConditions` node.
    pub fn load(node: &ParsedNode) -> Result<Self> {
        let mut container = PreconditionContainer {
            on_fail: policy_attr(node, "onFail")?.unwrap_or_default(),
            on_error: policy_attr(node, "onError")?.unwrap_or_default(),
            on_sql_output: policy_attr(node, "onSqlOutput")?.unwrap_or_default(),
            on_fail_message: node.child_string("onFailMessage"),
            on_error_message: node.child_string("onErrorMessage"),
            nested: Vec::new(),
        };
        for child in node.children() {
            if CONTAINER_ATTRIBUTES.contains(&child.name()) {
                continue;
            }
            container.nested.push(Precondition::load(child)?);
        }
        Ok(container)
    }

    pub fn with_on_fail(mut self, on_fail: FailurePolicy) -> Self {
        self.on_fail = on_fail;
        self
    }

    /// Append a nested precondition, returning the composed container.
    pub fn with_nested(mut self, precondition: Precondition) -> Self {
        self.nested.push(precondition);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.nested.is_empty()
    }
}

/// Root precondition collection of a document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangelogPreconditions {
    nested: Vec<PreconditionContainer>,
}

impl ChangelogPreconditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always `TEST`, whatever the nested containers say.
    pub fn on_sql_output(&self) -> SqlOutputPolicy {
        SqlOutputPolicy::Test
    }

    /// Attach `child` as one nested subtree, keeping its own policies.
    pub fn merged(mut self, child: PreconditionContainer) -> Self {
        self.nested.push(child);
        self
    }

    /// Convert into a container so it can be nested under another root.
    pub fn into_container(self) -> PreconditionContainer {
        PreconditionContainer {
            on_sql_output: SqlOutputPolicy::Test,
            nested: self
                .nested
                .into_iter()
                .map(Precondition::Container)
                .collect(),
            ..PreconditionContainer::default()
        }
    }

    pub fn nested(&self) -> &[PreconditionContainer] {
        &self.nested
    }

    pub fn len(&self) -> usize {
        self.nested.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nested.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preconditions_node() -> ParsedNode {
        ParsedNode::new("preConditions")
            .with_attr("onFail", "MARK_RAN")
            .with_attr("onFailMessage", "table already there")
            .with_child(
                ParsedNode::new("not").with_child(
                    ParsedNode::new("tableExists").with_attr("tableName", "person"),
                ),
            )
            .with_child(ParsedNode::new("dbms").with_attr("type", "postgresql"))
    }

    #[test]
    fn test_load_container() {
        let container = PreconditionContainer::load(&preconditions_node()).unwrap();
        assert_eq!(container.on_fail, FailurePolicy::MarkRan);
        assert_eq!(container.on_error, FailurePolicy::Halt);
        assert_eq!(container.on_sql_output, SqlOutputPolicy::Ignore);
        assert_eq!(container.on_fail_message.as_deref(), Some("table already there"));
        assert_eq!(container.nested.len(), 2);

        match &container.nested[0] {
            Precondition::Not(inner) => match &inner[0] {
                Precondition::Check { name, params } => {
                    assert_eq!(name, "tableExists");
                    assert_eq!(params.get("tableName").map(String::as_str), Some("person"));
                }
                other => panic!("Expected check, got {:?}", other),
            },
            other => panic!("Expected not, got {:?}", other),
        }
    }

    #[test]
    fn test_load_container_rejects_unknown_policy() {
        let node = ParsedNode::new("preConditions").with_attr("onFail", "EXPLODE");
        let err = PreconditionContainer::load(&node).unwrap_err();
        assert!(format!("{}", err).contains("onFail"));
    }

    #[test]
    fn test_merge_two_children_keeps_their_policies() {
        let c1 = PreconditionContainer::new().with_on_fail(FailurePolicy::Warn);
        let c2 = PreconditionContainer::new().with_on_fail(FailurePolicy::Continue);

        let root = ChangelogPreconditions::new().merged(c1).merged(c2);

        assert_eq!(root.len(), 2);
        assert_eq!(root.nested()[0].on_fail, FailurePolicy::Warn);
        assert_eq!(root.nested()[1].on_fail, FailurePolicy::Continue);
        assert_eq!(root.on_sql_output(), SqlOutputPolicy::Test);
    }

    #[test]
    fn test_root_policy_stays_test_with_failing_children() {
        let mut child = PreconditionContainer::new();
        child.on_sql_output = SqlOutputPolicy::Fail;
        let root = ChangelogPreconditions::new().merged(child);
        assert_eq!(root.on_sql_output(), SqlOutputPolicy::Test);
        assert_eq!(root.nested()[0].on_sql_output, SqlOutputPolicy::Fail);
    }

    #[test]
    fn test_into_container_nests_whole_tree() {
        let included = ChangelogPreconditions::new()
            .merged(PreconditionContainer::new().with_on_fail(FailurePolicy::MarkRan));
        let container = included.into_container();
        assert_eq!(container.on_sql_output, SqlOutputPolicy::Test);
        assert_eq!(container.nested.len(), 1);
        assert!(matches!(
            &container.nested[0],
            Precondition::Container(inner) if inner.on_fail == FailurePolicy::MarkRan
        ));

        let parent = ChangelogPreconditions::new().merged(container);
        assert_eq!(parent.len(), 1);
    }
}
