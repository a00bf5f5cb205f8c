//! # Resolution Settings
//!
//! Describes the runtime a resolution is performed for, read from a YAML
//! file such as `changelog-resolver.yaml`:
//!
//! ```yaml
//! database-type: postgresql
//! contexts: [dev, test]
//! labels: "!slow"
//! parameters:
//!   schema: app
//! search-path: [db, shared]
//! filters:
//!   sql-only: "**/*.sql"
//! ```
//!
//! Every key is optional. Command-line flags are layered on top with the
//! `with_*` methods before the settings are turned into the runtime
//! environment, the parameter store, the resource accessor and the
//! `includeAll` plugin registry.

use crate::error::{Error, Result};
use crate::filter::RuntimeEnvironment;
use crate::parameters::ChangelogParameters;
use crate::resource::{DirectoryResourceAccessor, GlobFilter, ResourcePlugins, StandardComparator};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name the standard `includeAll` comparator is registered under.
pub const STANDARD_COMPARATOR: &str = "standard";

/// Settings for one resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ResolveSettings {
    /// Target database short name, exposed as `database.typeName`.
    #[serde(default)]
    pub database_type: Option<String>,
    /// Active runtime contexts.
    #[serde(default)]
    pub contexts: Vec<String>,
    /// Runtime label expression.
    #[serde(default)]
    pub labels: Option<String>,
    /// Global parameters defined before any document is parsed.
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
    /// Directory roots searched for changelog resources.
    #[serde(default)]
    pub search_path: Vec<PathBuf>,
    /// Named `includeAll` filters, as glob patterns.
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
}

fn scalar(name: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(Error::Settings {
            message: format!("parameter '{}' must be a scalar value", name),
        }),
    }
}

impl ResolveSettings {
    pub fn with_database_type(mut self, database_type: &str) -> Self {
        self.database_type = Some(database_type.to_string());
        self
    }

    pub fn with_contexts<I, S>(mut self, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contexts.extend(contexts.into_iter().map(Into::into));
        self
    }

    pub fn with_labels(mut self, labels: &str) -> Self {
        self.labels = Some(labels.to_string());
        self
    }

    /// Define (or override) a global parameter.
    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        self.parameters
            .insert(name.to_string(), Value::String(value.to_string()));
        self
    }

    pub fn with_search_path<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_path.extend(roots.into_iter().map(Into::into));
        self
    }

    /// Runtime environment described by these settings.
    pub fn runtime(&self) -> RuntimeEnvironment {
        let mut runtime = RuntimeEnvironment::new().with_contexts(&self.contexts);
        if let Some(database_type) = &self.database_type {
            runtime = runtime.with_database_type(database_type);
        }
        if let Some(labels) = &self.labels {
            runtime = runtime.with_label_filter(labels);
        }
        runtime
    }

    /// A fresh parameter store seeded with the configured parameters.
    pub fn parameters(&self) -> Result<ChangelogParameters> {
        let mut parameters = ChangelogParameters::new(self.runtime());
        for (name, value) in &self.parameters {
            parameters.set_global(name, &scalar(name, value)?);
        }
        Ok(parameters)
    }

    /// Accessor over the search path, or over `default_root` when no search
    /// path is configured.
    pub fn accessor(&self, default_root: &Path) -> DirectoryResourceAccessor {
        if self.search_path.is_empty() {
            DirectoryResourceAccessor::new([default_root])
        } else {
            DirectoryResourceAccessor::new(self.search_path.iter().cloned())
        }
    }

    /// Registry of the configured filters plus the standard comparator.
    pub fn plugins(&self) -> Result<ResourcePlugins> {
        let mut plugins = ResourcePlugins::new();
        plugins.register_comparator(STANDARD_COMPARATOR, Arc::new(StandardComparator));
        for (name, pattern) in &self.filters {
            plugins.register_filter(name, Arc::new(GlobFilter::new(pattern)?));
        }
        Ok(plugins)
    }
}

/// Parse settings from YAML. Blank input yields the defaults.
pub fn parse(yaml_content: &str) -> Result<ResolveSettings> {
    if yaml_content.trim().is_empty() {
        return Ok(ResolveSettings::default());
    }
    serde_yaml::from_str(yaml_content).map_err(|e| Error::Settings {
        message: e.to_string(),
    })
}

/// Parse settings from a YAML file.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ResolveSettings> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| Error::Settings {
        message: format!("cannot read {}: {}", path.display(), e),
    })?;
    parse(&content)
}
