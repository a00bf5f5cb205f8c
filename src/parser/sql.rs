//! Formatted SQL changelogs
//!
//! A `.sql` file is a changelog only when its first non-blank line is the
//! `--liquibase formatted sql` header. Changesets are introduced by
//! `--changeset author:id` comment lines and carry the SQL up to the next
//! changeset:
//!
//! ```sql
//! --liquibase formatted sql
//!
//! --property name:schema value:app
//!
//! --changeset alice:1 runOrder:first context:dev
//! --comment: create the person table
//! create table ${schema}.person (id int);
//! --rollback drop table ${schema}.person;
//! ```
//!
//! Rollback lines are dropped; rollback execution lives elsewhere.

use super::{extension_of, read_resource, ChangelogParser};
use crate::error::{Error, Result};
use crate::node::ParsedNode;
use crate::resource::ResourceAccessor;
use regex::Regex;
use std::sync::LazyLock;

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*--\s*liquibase\s+formatted\s+sql\b").expect("header pattern is valid")
});
static CHANGESET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*--\s*changeset\s+(.*)$").expect("changeset pattern is valid")
});
static IDENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^("[^"]+"|[^:\s]+):("[^"]+"|\S+)"#).expect("identity pattern is valid")
});
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z]+):("[^"]*"|\S+)"#).expect("attribute pattern is valid")
});
static COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*--\s*comment:?\s*(.*)$").expect("comment pattern is valid")
});
static PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*--\s*property\s+(.*)$").expect("property pattern is valid")
});
static ROLLBACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*--\s*rollback\b").expect("rollback pattern is valid")
});

/// Canonical attribute names, matched case-insensitively.
const CHANGESET_ATTRIBUTES: &[&str] = &[
    "dbms",
    "runOrder",
    "context",
    "contextFilter",
    "labels",
    "ignore",
    "runAlways",
    "runOnChange",
    "failOnError",
    "logicalFilePath",
    "created",
];

const PROPERTY_ATTRIBUTES: &[&str] = &["name", "value", "context", "labels", "dbms", "global"];

fn unquote(raw: &str) -> &str {
    raw.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(raw)
}

/// Parse `name:value` pairs, mapping names onto `known` case-insensitively.
fn attributes(raw: &str, known: &[&str]) -> Vec<(String, String)> {
    ATTRIBUTE
        .captures_iter(raw)
        .map(|caps| {
            let name = known
                .iter()
                .find(|known| known.eq_ignore_ascii_case(&caps[1]))
                .map(|known| known.to_string())
                .unwrap_or_else(|| caps[1].to_string());
            (name, unquote(&caps[2]).to_string())
        })
        .collect()
}

fn has_header(text: &str) -> bool {
    text.lines()
        .find(|line| !line.trim().is_empty())
        .is_some_and(|line| HEADER.is_match(line))
}

/// A changeset being accumulated.
struct PendingChangeSet {
    node: ParsedNode,
    sql: Vec<String>,
}

impl PendingChangeSet {
    fn finish(mut self) -> ParsedNode {
        let sql = self.sql.join("\n");
        let sql = sql.trim();
        if !sql.is_empty() {
            self.node.push_child(ParsedNode::new("sql").with_value(sql));
        }
        self.node
    }
}

/// Parses `.sql` files carrying the formatted SQL header.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormattedSqlParser;

impl FormattedSqlParser {
    fn parse_text(&self, path: &str, text: &str) -> Result<ParsedNode> {
        let mut document = ParsedNode::new("databaseChangeLog");
        let mut pending: Option<PendingChangeSet> = None;

        for (index, line) in text.lines().enumerate() {
            if HEADER.is_match(line) {
                continue;
            }

            if let Some(caps) = CHANGESET.captures(line) {
                if let Some(done) = pending.take() {
                    document.push_child(done.finish());
                }
                let rest = caps[1].trim();
                let identity = IDENTITY.captures(rest).ok_or_else(|| Error::Malformed {
                    path: path.to_string(),
                    message: format!(
                        "line {}: expected '--changeset author:id', got '{}'",
                        index + 1,
                        line.trim()
                    ),
                })?;

                let mut node = ParsedNode::new("changeSet")
                    .with_attr("author", unquote(&identity[1]))
                    .with_attr("id", unquote(&identity[2]));
                for (name, value) in attributes(&rest[identity[0].len()..], CHANGESET_ATTRIBUTES) {
                    node = node.with_attr(&name, value);
                }
                pending = Some(PendingChangeSet {
                    node,
                    sql: Vec::new(),
                });
                continue;
            }

            if let Some(caps) = PROPERTY.captures(line) {
                let mut node = ParsedNode::new("property");
                for (name, value) in attributes(&caps[1], PROPERTY_ATTRIBUTES) {
                    node = node.with_attr(&name, value);
                }
                document.push_child(node);
                continue;
            }

            // Rollback statements span only their own comment line.
            if ROLLBACK.is_match(line) {
                continue;
            }

            let Some(current) = pending.as_mut() else {
                continue;
            };

            if let Some(caps) = COMMENT.captures(line) {
                current.node.push_child(ParsedNode::new("comment").with_value(caps[1].trim()));
                continue;
            }

            current.sql.push(line.to_string());
        }

        if let Some(done) = pending {
            document.push_child(done.finish());
        }
        Ok(document)
    }
}

impl ChangelogParser for FormattedSqlParser {
    fn name(&self) -> &'static str {
        "formatted-sql"
    }

    /// Requires the `.sql` extension and the header. A file that cannot be
    /// read is claimed so the read error surfaces from `parse_node`.
    fn supports(&self, path: &str, accessor: &dyn ResourceAccessor) -> bool {
        if extension_of(path).as_deref() != Some("sql") {
            return false;
        }
        match accessor.open(None, path) {
            Ok(Some(bytes)) => has_header(&String::from_utf8_lossy(&bytes)),
            _ => true,
        }
    }

    fn parse_node(&self, path: &str, accessor: &dyn ResourceAccessor) -> Result<ParsedNode> {
        let text = read_resource(path, accessor)?;
        self.parse_text(path, &text)
    }
}
