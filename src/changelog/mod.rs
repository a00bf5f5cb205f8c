//! # Changelog Documents
//!
//! A changelog document is one parsed unit: its own changesets, its own
//! `preConditions` blocks and any number of `include`/`includeAll`
//! directives pulling further documents in. Resolution flattens the whole
//! tree into the root document:
//!
//! 1. The document's metadata is read into a `ChangelogHeader`, which is
//!    immutable from then on and shared by every changeset it owns.
//! 2. Each child node has its `${...}` placeholders expanded and is then
//!    dispatched by name (see `Resolver`).
//! 3. Included documents are parsed recursively, their precondition roots
//!    nested into the includer's and their changesets folded in through the
//!    ordering engine.
//!
//! Root and parent linkage is carried by an explicit `ResolutionContext`
//! instead of ambient state, see the `context` module.

pub mod context;
mod include;
mod resolver;

pub use context::{IncludeScope, ResolutionContext};
pub use include::{IncludeAllDirective, IncludeDirective, OnUnknownFormat};
pub use resolver::Resolver;

use crate::changeset::{ChangeSet, RanChangeSet};
use crate::error::{Error, Result};
use crate::filter::{dbms_matches, ContextExpression, Labels};
use crate::node::ParsedNode;
use crate::parameters::ChangelogParameters;
use crate::path::logical_form;
use crate::precondition::ChangelogPreconditions;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::{Arc, Weak};

/// How database object names are quoted when the document's changesets run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectQuotingStrategy {
    #[default]
    Legacy,
    QuoteAllObjects,
    QuoteOnlyReservedWords,
}

impl FromStr for ObjectQuotingStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "LEGACY" => Ok(ObjectQuotingStrategy::Legacy),
            "QUOTE_ALL_OBJECTS" => Ok(ObjectQuotingStrategy::QuoteAllObjects),
            "QUOTE_ONLY_RESERVED_WORDS" => Ok(ObjectQuotingStrategy::QuoteOnlyReservedWords),
            other => Err(format!("unknown object quoting strategy '{}'", other)),
        }
    }
}

impl fmt::Display for ObjectQuotingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectQuotingStrategy::Legacy => "LEGACY",
            ObjectQuotingStrategy::QuoteAllObjects => "QUOTE_ALL_OBJECTS",
            ObjectQuotingStrategy::QuoteOnlyReservedWords => "QUOTE_ONLY_RESERVED_WORDS",
        };
        f.write_str(name)
    }
}

/// Identity and metadata of a changelog document.
///
/// Equality, ordering and hashing use `file_path()` only.
#[derive(Debug)]
pub struct ChangelogHeader {
    physical_path: String,
    logical_path: Option<String>,
    id: Option<String>,
    quoting: ObjectQuotingStrategy,
    contexts: ContextExpression,
    include_scope: IncludeScope,
    root: Weak<ChangelogHeader>,
    parent: Option<Arc<ChangelogHeader>>,
}

impl ChangelogHeader {
    /// Read document metadata from the top node of a parsed document and
    /// link the header into the resolution described by `ctx`.
    pub fn from_node(
        physical_path: &str,
        node: &ParsedNode,
        ctx: &ResolutionContext,
    ) -> Result<Arc<Self>> {
        let quoting = match node.child_str("objectQuotingStrategy") {
            Some(raw) => raw.parse().map_err(|message| Error::Malformed {
                path: physical_path.to_string(),
                message,
            })?,
            None => ObjectQuotingStrategy::default(),
        };
        let logical_path = node.child_string("logicalFilePath");
        let id = node.child_string("changeLogId");
        let contexts = ContextExpression::new(node.child_str("context"));

        Ok(Arc::new_cyclic(|me| ChangelogHeader {
            physical_path: physical_path.to_string(),
            logical_path,
            id,
            quoting,
            contexts,
            include_scope: ctx.scope().clone(),
            root: ctx.root().cloned().unwrap_or_else(|| me.clone()),
            parent: ctx.parent().cloned(),
        }))
    }

    /// A header with no metadata that is its own root.
    pub fn detached(physical_path: &str) -> Arc<Self> {
        Arc::new_cyclic(|me| ChangelogHeader {
            physical_path: physical_path.to_string(),
            logical_path: None,
            id: None,
            quoting: ObjectQuotingStrategy::default(),
            contexts: ContextExpression::default(),
            include_scope: IncludeScope::default(),
            root: me.clone(),
            parent: None,
        })
    }

    /// Path the document was loaded from.
    pub fn physical_path(&self) -> &str {
        &self.physical_path
    }

    /// Display identity: the declared logical path, or the physical path,
    /// with backslashes converted and a leading slash removed.
    pub fn logical_file_path(&self) -> String {
        logical_form(self.logical_path.as_deref().unwrap_or(&self.physical_path))
    }

    /// Identity path: the physical path unless a logical path was declared.
    pub fn file_path(&self) -> String {
        match &self.logical_path {
            Some(_) => self.logical_file_path(),
            None => self.physical_path.clone(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn object_quoting_strategy(&self) -> ObjectQuotingStrategy {
        self.quoting
    }

    /// The document's own `context` filter.
    pub fn contexts(&self) -> &ContextExpression {
        &self.contexts
    }

    /// Context filter of the include that pulled this document in.
    pub fn include_contexts(&self) -> &ContextExpression {
        &self.include_scope.contexts
    }

    /// Labels of the include that pulled this document in.
    pub fn include_labels(&self) -> &Labels {
        &self.include_scope.labels
    }

    /// Whether the include that pulled this document in was marked ignored.
    pub fn is_include_ignored(&self) -> bool {
        self.include_scope.ignore
    }

    /// Root document of the resolution this document belongs to. A
    /// top-level document is its own root. `None` once the root has been
    /// dropped.
    pub fn root(&self) -> Option<Arc<ChangelogHeader>> {
        self.root.upgrade()
    }

    /// The document that included this one. `None` for a top-level document.
    ///
    /// Parents are held strongly, so a document that only includes others
    /// stays reachable from everything below it.
    pub fn parent(&self) -> Option<Arc<ChangelogHeader>> {
        self.parent.clone()
    }
}

impl PartialEq for ChangelogHeader {
    fn eq(&self, other: &Self) -> bool {
        self.file_path() == other.file_path()
    }
}

impl Eq for ChangelogHeader {}

impl PartialOrd for ChangelogHeader {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChangelogHeader {
    fn cmp(&self, other: &Self) -> Ordering {
        self.file_path().cmp(&other.file_path())
    }
}

impl Hash for ChangelogHeader {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.file_path().hash(state);
    }
}

impl fmt::Display for ChangelogHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_path())
    }
}

/// A resolved changelog document.
#[derive(Debug, Clone)]
pub struct ChangelogDocument {
    header: Arc<ChangelogHeader>,
    change_sets: Vec<ChangeSet>,
    preconditions: ChangelogPreconditions,
}

impl ChangelogDocument {
    pub fn new(header: Arc<ChangelogHeader>) -> Self {
        Self {
            header,
            change_sets: Vec::new(),
            preconditions: ChangelogPreconditions::new(),
        }
    }

    pub fn header(&self) -> &Arc<ChangelogHeader> {
        &self.header
    }

    pub fn file_path(&self) -> String {
        self.header.file_path()
    }

    /// Changesets in their final run order.
    pub fn change_sets(&self) -> &[ChangeSet] {
        &self.change_sets
    }

    pub fn preconditions(&self) -> &ChangelogPreconditions {
        &self.preconditions
    }

    /// Insert a changeset according to its run-order hint.
    pub fn add_change_set(&mut self, change_set: ChangeSet) -> Result<()> {
        crate::ordering::insert(&mut self.change_sets, change_set)
    }

    pub(crate) fn take_preconditions(&mut self) -> ChangelogPreconditions {
        std::mem::take(&mut self.preconditions)
    }

    pub(crate) fn set_preconditions(&mut self, preconditions: ChangelogPreconditions) {
        self.preconditions = preconditions;
    }

    pub(crate) fn into_parts(self) -> (Arc<ChangelogHeader>, Vec<ChangeSet>, ChangelogPreconditions) {
        (self.header, self.change_sets, self.preconditions)
    }

    /// Whether a dbms set applies to the database this document targets.
    /// An empty set, or no known database type, matches.
    pub fn is_dbms_match(&self, parameters: &ChangelogParameters, dbms: &BTreeSet<String>) -> bool {
        let file_path = self.file_path();
        match parameters.database_type(Some(&file_path)) {
            Some(database) => dbms_matches(dbms, database, true),
            None => true,
        }
    }

    /// Look up a changeset by identity.
    ///
    /// Paths are compared after normalization, and path, author and id are
    /// all case-insensitive. The changeset must also apply to the target
    /// database.
    pub fn find_changeset(
        &self,
        parameters: &ChangelogParameters,
        path: &str,
        author: &str,
        id: &str,
    ) -> Option<&ChangeSet> {
        self.change_sets.iter().find(|change_set| {
            change_set.matches_identity(path, author, id)
                && self.is_dbms_match(parameters, change_set.dbms())
        })
    }

    /// Look up the changeset an execution history record refers to. The
    /// returned copy carries the record's stored path.
    pub fn find_ran_changeset(
        &self,
        parameters: &ChangelogParameters,
        ran: &RanChangeSet,
    ) -> Option<ChangeSet> {
        self.find_changeset(parameters, &ran.changelog, &ran.author, &ran.id)
            .map(|change_set| {
                let mut found = change_set.clone();
                found.set_stored_file_path(&ran.stored_changelog);
                found
            })
    }
}

impl fmt::Display for ChangelogDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.header, f)
    }
}
