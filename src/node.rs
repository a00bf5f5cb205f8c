//! Generic parsed-node tree
//!
//! Every changelog format is turned into the same shape before the resolver
//! sees it: a named node with an optional scalar value and ordered children.
//! Attributes of a node are simply childless children, so `include` with a
//! `file` attribute is a node named `include` with a child named `file`.

use crate::error::{Error, Result};
use serde_yaml::Value;

/// One node of a parsed changelog.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedNode {
    name: String,
    value: Option<String>,
    children: Vec<ParsedNode>,
}

impl ParsedNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            children: Vec::new(),
        }
    }

    /// Builder: set the scalar value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Builder: append a child node.
    pub fn with_child(mut self, child: ParsedNode) -> Self {
        self.children.push(child);
        self
    }

    /// Builder: append a childless attribute node.
    pub fn with_attr(self, name: &str, value: impl Into<String>) -> Self {
        self.with_child(ParsedNode::new(name).with_value(value))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: Option<String>) {
        self.value = value;
    }

    pub fn children(&self) -> &[ParsedNode] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<ParsedNode> {
        &mut self.children
    }

    pub fn push_child(&mut self, child: ParsedNode) {
        self.children.push(child);
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&ParsedNode> {
        self.children.iter().find(|child| child.name == name)
    }

    /// String value of the named direct child. Blank values count as absent.
    pub fn child_str(&self, name: &str) -> Option<&str> {
        self.child(name)
            .and_then(ParsedNode::value)
            .filter(|value| !value.trim().is_empty())
    }

    /// Owned string value of the named direct child.
    pub fn child_string(&self, name: &str) -> Option<String> {
        self.child_str(name).map(str::to_string)
    }

    /// Boolean value of the named direct child.
    pub fn child_bool(&self, name: &str) -> Result<Option<bool>> {
        match self.child_str(name) {
            None => Ok(None),
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                other => Err(Error::InvalidAttribute {
                    node: self.name.clone(),
                    attribute: name.to_string(),
                    message: format!("expected a boolean, got '{}'", other),
                }),
            },
        }
    }

    /// Boolean value of the named direct child, or `default` when absent.
    pub fn child_bool_or(&self, name: &str, default: bool) -> Result<bool> {
        Ok(self.child_bool(name)?.unwrap_or(default))
    }

    /// Build a node from a YAML/JSON value.
    ///
    /// Mappings become children keyed by name, scalars become the value, a
    /// sequence of scalars becomes a comma-joined value, and a sequence of
    /// single-key mappings becomes one child per entry.
    pub fn from_value(name: &str, value: &Value) -> Result<Self> {
        let mut node = ParsedNode::new(name);
        match value {
            Value::Null => {}
            Value::Tagged(tagged) => return Self::from_value(name, &tagged.value),
            Value::Mapping(map) => {
                for (key, child) in map {
                    let key = scalar_to_string(key).ok_or_else(|| Error::InvalidAttribute {
                        node: name.to_string(),
                        attribute: format!("{:?}", key),
                        message: "mapping keys must be scalars".to_string(),
                    })?;
                    node.children.push(Self::from_value(&key, child)?);
                }
            }
            Value::Sequence(items) => {
                if items.iter().all(is_scalar) {
                    let joined: Vec<String> = items.iter().filter_map(scalar_to_string).collect();
                    node.value = Some(joined.join(","));
                } else {
                    for item in items {
                        match item {
                            Value::Mapping(map) if map.len() == 1 => {
                                for (key, child) in map {
                                    let key = scalar_to_string(key).ok_or_else(|| {
                                        Error::InvalidAttribute {
                                            node: name.to_string(),
                                            attribute: format!("{:?}", key),
                                            message: "mapping keys must be scalars".to_string(),
                                        }
                                    })?;
                                    node.children.push(Self::from_value(&key, child)?);
                                }
                            }
                            other => node.children.push(Self::from_value(name, other)?),
                        }
                    }
                }
            }
            scalar => node.value = scalar_to_string(scalar),
        }
        Ok(node)
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Null
    )
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_child_accessors() {
        let node = ParsedNode::new("include")
            .with_attr("file", "a.yaml")
            .with_attr("relativeToChangelogFile", "TRUE")
            .with_attr("context", "  ");

        assert_eq!(node.child_str("file"), Some("a.yaml"));
        assert_eq!(node.child_str("context"), None);
        assert_eq!(node.child_bool("relativeToChangelogFile").unwrap(), Some(true));
        assert!(!node.child_bool_or("ignore", false).unwrap());
        assert_eq!(node.children().len(), 3);
    }

    #[test]
    fn test_child_bool_invalid() {
        let node = ParsedNode::new("include").with_attr("ignore", "maybe");
        let err = node.child_bool("ignore").unwrap_err();
        assert!(format!("{}", err).contains("maybe"));
    }

    #[test]
    fn test_from_value_mapping_and_scalars() {
        let value = yaml(
            r#"
id: 1
author: alice
runAlways: true
"#,
        );
        let node = ParsedNode::from_value("changeSet", &value).unwrap();
        assert_eq!(node.name(), "changeSet");
        assert_eq!(node.child_str("id"), Some("1"));
        assert_eq!(node.child_str("author"), Some("alice"));
        assert_eq!(node.child_bool("runAlways").unwrap(), Some(true));
    }

    #[test]
    fn test_from_value_sequence_of_single_key_mappings() {
        let value = yaml(
            r#"
- changeSet:
    id: 1
    author: a
- include:
    file: b.yaml
"#,
        );
        let node = ParsedNode::from_value("databaseChangeLog", &value).unwrap();
        let names: Vec<&str> = node.children().iter().map(ParsedNode::name).collect();
        assert_eq!(names, vec!["changeSet", "include"]);
        assert_eq!(node.children()[1].child_str("file"), Some("b.yaml"));
    }

    #[test]
    fn test_from_value_scalar_sequence_is_joined() {
        let value = yaml("dbms: [postgresql, h2]");
        let node = ParsedNode::from_value("changeSet", &value).unwrap();
        assert_eq!(node.child_str("dbms"), Some("postgresql,h2"));
    }

    #[test]
    fn test_from_value_null_has_no_value() {
        let node = ParsedNode::from_value("comment", &Value::Null).unwrap();
        assert_eq!(node.value(), None);
        assert!(!node.has_children());
    }
}
