//! YAML and JSON changelog parsers
//!
//! Both formats share one layout: a top-level `databaseChangeLog` key whose
//! value is a list of single-key mappings.
//!
//! ```yaml
//! databaseChangeLog:
//!   - logicalFilePath: db/changelog.yaml
//!   - property:
//!       name: schema
//!       value: app
//!   - include:
//!       file: changes/001-person.yaml
//!       relativeToChangelogFile: true
//!   - changeSet:
//!       id: 1
//!       author: alice
//!       changes:
//!         - createTable:
//!             tableName: ${schema}.person
//! ```

use super::{extension_of, read_resource, ChangelogParser};
use crate::error::{Error, Result};
use crate::node::ParsedNode;
use crate::resource::ResourceAccessor;
use serde_yaml::Value;

const ROOT_KEY: &str = "databaseChangeLog";

fn to_document(path: &str, value: Value) -> Result<ParsedNode> {
    let root = match value {
        Value::Null => {
            return Err(Error::Malformed {
                path: path.to_string(),
                message: "empty file".to_string(),
            })
        }
        Value::Mapping(mut map) => map.remove(ROOT_KEY),
        _ => None,
    };
    let root = root.ok_or_else(|| Error::Malformed {
        path: path.to_string(),
        message: format!("could not find {} node", ROOT_KEY),
    })?;
    ParsedNode::from_value(ROOT_KEY, &root)
}

/// Parses `.yaml` and `.yml` changelogs.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

impl ChangelogParser for YamlParser {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn supports(&self, path: &str, _accessor: &dyn ResourceAccessor) -> bool {
        matches!(extension_of(path).as_deref(), Some("yaml") | Some("yml"))
    }

    fn parse_node(&self, path: &str, accessor: &dyn ResourceAccessor) -> Result<ParsedNode> {
        let text = read_resource(path, accessor)?;
        let value: Value = serde_yaml::from_str(&text).map_err(|e| Error::Malformed {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        to_document(path, value)
    }
}

/// Parses `.json` changelogs.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl ChangelogParser for JsonParser {
    fn name(&self) -> &'static str {
        "json"
    }

    fn supports(&self, path: &str, _accessor: &dyn ResourceAccessor) -> bool {
        extension_of(path).as_deref() == Some("json")
    }

    fn parse_node(&self, path: &str, accessor: &dyn ResourceAccessor) -> Result<ParsedNode> {
        let text = read_resource(path, accessor)?;
        let value: Value = serde_json::from_str(&text).map_err(|e| Error::Malformed {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        to_document(path, value)
    }
}
