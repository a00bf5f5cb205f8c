//! Changeset entries
//!
//! A changeset is identified by `(file path, author, id)` and remembers the
//! document it was declared in. The change payload itself is kept as opaque
//! parsed nodes; turning it into SQL belongs to the execution subsystem.

use crate::changelog::ChangelogHeader;
use crate::error::{Error, Result};
use crate::filter::{dbms_set, ContextExpression, Labels};
use crate::node::ParsedNode;
use crate::ordering::RunOrdered;
use crate::path::normalize_path;
use crate::precondition::PreconditionContainer;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Attributes consumed by `ChangeSet::load`; any other child is a change.
const CHANGESET_ATTRIBUTES: &[&str] = &[
    "id",
    "author",
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
    "comment",
    "preConditions",
    "created",
];

/// A single changeset.
#[derive(Debug, Clone)]
pub struct ChangeSet {
    changelog: Arc<ChangelogHeader>,
    id: String,
    author: String,
    file_path: String,
    dbms: BTreeSet<String>,
    run_order: Option<String>,
    contexts: ContextExpression,
    labels: Labels,
    ignore: bool,
    run_always: bool,
    run_on_change: bool,
    fail_on_error: Option<bool>,
    comment: Option<String>,
    created: Option<String>,
    preconditions: Option<PreconditionContainer>,
    changes: Vec<ParsedNode>,
    stored_file_path: Option<String>,
}

fn required(node: &ParsedNode, attribute: &str, path: &str) -> Result<String> {
    node.child_string(attribute).ok_or_else(|| Error::Malformed {
        path: path.to_string(),
        message: format!("changeSet is missing required attribute '{}'", attribute),
    })
}

/// Case-insensitive equality over full Unicode lowercase.
fn fold_eq(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

impl ChangeSet {
    /// Build a changeset owned by `changelog` from a `changeSet` node.
    pub fn load(node: &ParsedNode, changelog: Arc<ChangelogHeader>) -> Result<Self> {
        let owner_path = changelog.file_path();
        let id = required(node, "id", &owner_path)?;
        let author = required(node, "author", &owner_path)?;

        let contexts = node
            .child_str("contextFilter")
            .or_else(|| node.child_str("context"));

        let preconditions = match node.child("preConditions") {
            Some(child) => Some(PreconditionContainer::load(child)?),
            None => None,
        };

        let changes = node
            .children()
            .iter()
            .filter(|child| !CHANGESET_ATTRIBUTES.contains(&child.name()))
            .cloned()
            .collect();

        Ok(Self {
            file_path: node
                .child_string("logicalFilePath")
                .unwrap_or(owner_path),
            id,
            author,
            dbms: dbms_set(node.child_str("dbms")),
            run_order: node.child_string("runOrder"),
            contexts: ContextExpression::new(contexts),
            labels: Labels::new(node.child_str("labels")),
            ignore: node.child_bool_or("ignore", false)?,
            run_always: node.child_bool_or("runAlways", false)?,
            run_on_change: node.child_bool_or("runOnChange", false)?,
            fail_on_error: node.child_bool("failOnError")?,
            comment: node.child_string("comment"),
            created: node.child_string("created"),
            preconditions,
            changes,
            stored_file_path: None,
            changelog,
        })
    }

    /// The document this changeset was declared in.
    pub fn changelog(&self) -> &Arc<ChangelogHeader> {
        &self.changelog
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Identity path: the changeset's own logical path if declared, else
    /// the owning document's file path.
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// Databases this changeset applies to. Empty means all.
    pub fn dbms(&self) -> &BTreeSet<String> {
        &self.dbms
    }

    pub fn contexts(&self) -> &ContextExpression {
        &self.contexts
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore
    }

    pub fn run_always(&self) -> bool {
        self.run_always
    }

    pub fn run_on_change(&self) -> bool {
        self.run_on_change
    }

    pub fn fail_on_error(&self) -> Option<bool> {
        self.fail_on_error
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn created(&self) -> Option<&str> {
        self.created.as_deref()
    }

    pub fn preconditions(&self) -> Option<&PreconditionContainer> {
        self.preconditions.as_ref()
    }

    /// Opaque change nodes, in declaration order.
    pub fn changes(&self) -> &[ParsedNode] {
        &self.changes
    }

    /// Path recorded in execution history, set when the changeset was
    /// located from a history record.
    pub fn stored_file_path(&self) -> Option<&str> {
        self.stored_file_path.as_deref()
    }

    pub(crate) fn set_stored_file_path(&mut self, path: &str) {
        self.stored_file_path = Some(path.to_string());
    }

    /// Whether this changeset has the identity `(path, author, id)`.
    /// Path, author and id compare case-insensitively, paths after
    /// normalization.
    pub fn matches_identity(&self, path: &str, author: &str, id: &str) -> bool {
        fold_eq(&normalize_path(&self.file_path), &normalize_path(path))
            && fold_eq(&self.author, author)
            && fold_eq(&self.id, id)
    }
}

impl RunOrdered for ChangeSet {
    fn run_order(&self) -> Option<&str> {
        self.run_order.as_deref()
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.file_path, self.id, self.author)
    }
}

/// A changeset as recorded in execution history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RanChangeSet {
    /// Changelog path as recorded.
    pub changelog: String,
    pub author: String,
    pub id: String,
    /// Exact path string stored in history, which may differ from
    /// `changelog` in prefix or separators.
    pub stored_changelog: String,
}

impl RanChangeSet {
    pub fn new(changelog: &str, author: &str, id: &str) -> Self {
        Self {
            changelog: changelog.to_string(),
            author: author.to_string(),
            id: id.to_string(),
            stored_changelog: changelog.to_string(),
        }
    }

    pub fn with_stored_changelog(mut self, stored: &str) -> Self {
        self.stored_changelog = stored.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changelog::ChangelogHeader;

    fn header(path: &str) -> Arc<ChangelogHeader> {
        ChangelogHeader::detached(path)
    }

    fn changeset_node() -> ParsedNode {
        ParsedNode::new("changeSet")
            .with_attr("id", "1")
            .with_attr("author", "Alice")
            .with_attr("dbms", "postgresql, h2")
            .with_attr("runOrder", "first")
            .with_attr("context", "dev")
            .with_attr("labels", "core")
            .with_attr("runOnChange", "true")
            .with_attr("comment", "create person")
            .with_child(
                ParsedNode::new("changes").with_child(
                    ParsedNode::new("createTable").with_attr("tableName", "person"),
                ),
            )
    }

    #[test]
    fn test_load_changeset() {
        let changeset = ChangeSet::load(&changeset_node(), header("db/changelog.yaml")).unwrap();
        assert_eq!(changeset.id(), "1");
        assert_eq!(changeset.author(), "Alice");
        assert_eq!(changeset.file_path(), "db/changelog.yaml");
        assert_eq!(changeset.run_order(), Some("first"));
        assert!(changeset.dbms().contains("postgresql"));
        assert!(changeset.dbms().contains("h2"));
        assert_eq!(changeset.contexts().as_str(), "dev");
        assert!(changeset.labels().contains("core"));
        assert!(changeset.run_on_change());
        assert!(!changeset.run_always());
        assert_eq!(changeset.comment(), Some("create person"));
        assert_eq!(changeset.changes().len(), 1);
        assert_eq!(changeset.changes()[0].name(), "changes");
        assert_eq!(changeset.stored_file_path(), None);
        assert_eq!(changeset.to_string(), "db/changelog.yaml::1::Alice");
    }

    #[test]
    fn test_load_changeset_missing_author() {
        let node = ParsedNode::new("changeSet").with_attr("id", "1");
        let err = ChangeSet::load(&node, header("db/a.yaml")).unwrap_err();
        let display = format!("{}", err);
        assert!(display.contains("author"));
        assert!(display.contains("db/a.yaml"));
    }

    #[test]
    fn test_logical_file_path_overrides_identity() {
        let node = ParsedNode::new("changeSet")
            .with_attr("id", "1")
            .with_attr("author", "a")
            .with_attr("logicalFilePath", "legacy/path.xml");
        let changeset = ChangeSet::load(&node, header("db/a.yaml")).unwrap();
        assert_eq!(changeset.file_path(), "legacy/path.xml");
        assert_eq!(changeset.changelog().file_path(), "db/a.yaml");
    }

    #[test]
    fn test_matches_identity_is_case_and_prefix_insensitive() {
        let changeset = ChangeSet::load(&changeset_node(), header("db/changelog.yaml")).unwrap();
        assert!(changeset.matches_identity("classpath:/DB/Changelog.yaml", "alice", "1"));
        assert!(changeset.matches_identity("db\\changelog.yaml", "ALICE", "1"));
        assert!(!changeset.matches_identity("db/changelog.yaml", "alice", "2"));
        assert!(!changeset.matches_identity("db/other.yaml", "alice", "1"));
    }

    #[test]
    fn test_matches_identity_folds_non_ascii_case() {
        let node = ParsedNode::new("changeSet")
            .with_attr("id", "Größe-1")
            .with_attr("author", "Émile");
        let changeset = ChangeSet::load(&node, header("db/Ünicode.yaml")).unwrap();
        assert!(changeset.matches_identity("DB/ÜNICODE.YAML", "émile", "GRÖßE-1"));
        assert!(changeset.matches_identity("db/ünicode.yaml", "ÉMILE", "größe-1"));
        assert!(!changeset.matches_identity("db/unicode.yaml", "emile", "größe-1"));
    }
}
