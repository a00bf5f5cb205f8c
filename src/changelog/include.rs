//! `include` and `includeAll` resolution
//!
//! An include parses one more document under a context that names the
//! including document as parent, then folds it into the includer: the
//! child's precondition root is nested as a single container and each of
//! its changesets is re-inserted through the ordering engine, so `first`
//! and `last` hints keep working across document boundaries.
//!
//! Files no parser recognizes are handled by `OnUnknownFormat`. Only the
//! file being included is subject to that policy; failures inside it arrive
//! wrapped in `Error::Include` and always propagate.

use super::{ChangelogDocument, IncludeScope, ResolutionContext, Resolver};
use crate::error::{Error, Result};
use crate::node::ParsedNode;
use crate::path::{concat, directory_of, is_vcs_artifact, strip_classpath};
use crate::resource::{IncludeAllFilter, ResourceComparator, ResourcePlugins, StandardComparator};
use log::{debug, info, warn};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, LazyLock};

static BARE_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.\w+$").expect("bare extension pattern is valid"));

/// What to do when an included file is not a recognized changelog format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnUnknownFormat {
    /// Skip silently.
    Skip,
    /// Log a warning and skip.
    Warn,
    /// Return the error.
    #[default]
    Fail,
}

fn include_scope(node: &ParsedNode) -> Result<IncludeScope> {
    Ok(IncludeScope::new(
        node.child_str("context"),
        node.child_str("labels"),
        node.child_bool_or("ignore", false)?,
    ))
}

/// A single `include`.
#[derive(Debug, Clone)]
pub struct IncludeDirective {
    pub file: String,
    pub relative_to_changelog_file: bool,
    pub scope: IncludeScope,
    pub on_unknown_format: OnUnknownFormat,
}

impl IncludeDirective {
    pub fn new(file: &str) -> Self {
        Self {
            file: file.to_string(),
            relative_to_changelog_file: false,
            scope: IncludeScope::default(),
            on_unknown_format: OnUnknownFormat::default(),
        }
    }

    pub fn relative_to_changelog_file(mut self, relative: bool) -> Self {
        self.relative_to_changelog_file = relative;
        self
    }

    pub fn with_scope(mut self, scope: IncludeScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_on_unknown_format(mut self, policy: OnUnknownFormat) -> Self {
        self.on_unknown_format = policy;
        self
    }

    /// Read an `include` node. `file` is required.
    pub fn from_node(node: &ParsedNode) -> Result<Self> {
        let file = node.child_str("file").ok_or_else(|| Error::Setup {
            message: "No 'file' attribute on 'include'".to_string(),
        })?;
        Ok(Self::new(&file.replace('\\', "/"))
            .relative_to_changelog_file(node.child_bool_or("relativeToChangelogFile", false)?)
            .with_scope(include_scope(node)?))
    }
}

/// An `includeAll` over a directory.
#[derive(Clone)]
pub struct IncludeAllDirective {
    pub path: String,
    pub relative_to_changelog_file: bool,
    pub filter: Option<Arc<dyn IncludeAllFilter>>,
    pub comparator: Arc<dyn ResourceComparator>,
    pub error_if_missing_or_empty: bool,
    pub scope: IncludeScope,
}

impl IncludeAllDirective {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            relative_to_changelog_file: false,
            filter: None,
            comparator: Arc::new(StandardComparator),
            error_if_missing_or_empty: true,
            scope: IncludeScope::default(),
        }
    }

    pub fn relative_to_changelog_file(mut self, relative: bool) -> Self {
        self.relative_to_changelog_file = relative;
        self
    }

    pub fn with_filter(mut self, filter: Arc<dyn IncludeAllFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_comparator(mut self, comparator: Arc<dyn ResourceComparator>) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn error_if_missing_or_empty(mut self, error: bool) -> Self {
        self.error_if_missing_or_empty = error;
        self
    }

    pub fn with_scope(mut self, scope: IncludeScope) -> Self {
        self.scope = scope;
        self
    }

    /// Read an `includeAll` node, looking named filters and comparators up
    /// in `plugins`.
    pub fn from_node(node: &ParsedNode, plugins: &ResourcePlugins) -> Result<Self> {
        let path = node.child_str("path").ok_or_else(|| Error::Setup {
            message: "No path attribute for includeAll".to_string(),
        })?;
        let mut directive = Self::new(path)
            .relative_to_changelog_file(node.child_bool_or("relativeToChangelogFile", false)?)
            .error_if_missing_or_empty(node.child_bool_or("errorIfMissingOrEmpty", true)?)
            .with_scope(include_scope(node)?);

        let filter_name = node
            .child_str("filter")
            .or_else(|| node.child_str("resourceFilter"));
        if let Some(name) = filter_name {
            let filter = plugins.filter(name).ok_or_else(|| Error::Setup {
                message: format!("Unknown includeAll resource filter '{}'", name),
            })?;
            directive = directive.with_filter(filter);
        }

        if let Some(name) = node.child_str("resourceComparator") {
            match plugins.comparator(name) {
                Some(comparator) => directive = directive.with_comparator(comparator),
                None => info!(
                    "no resourceComparator named '{}' - taking default implementation",
                    name
                ),
            }
        }
        Ok(directive)
    }
}

impl fmt::Debug for IncludeAllDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncludeAllDirective")
            .field("path", &self.path)
            .field("relative_to_changelog_file", &self.relative_to_changelog_file)
            .field("filtered", &self.filter.is_some())
            .field("error_if_missing_or_empty", &self.error_if_missing_or_empty)
            .field("scope", &self.scope)
            .finish()
    }
}

impl Resolver<'_> {
    /// Resolve one include into `document`. Returns whether a document was
    /// included.
    pub fn include(
        &mut self,
        document: &mut ChangelogDocument,
        directive: &IncludeDirective,
        ctx: &ResolutionContext,
    ) -> Result<bool> {
        if is_vcs_artifact(&directive.file) {
            return Ok(false);
        }

        let mut relative_base = document.header().physical_path().to_string();
        let mut file = directive.file.clone();
        if directive.relative_to_changelog_file {
            relative_base = strip_classpath(&relative_base);
            file = concat(&directory_of(&relative_base), &file);
        }
        let file = strip_classpath(&file);

        let nested = ctx.descend(document.header(), directive.scope.clone());
        let child = match self.parse(&file, &nested) {
            Ok(child) => child,
            Err(Error::UnknownFormat { .. })
                if directive.on_unknown_format != OnUnknownFormat::Fail =>
            {
                if directive.on_unknown_format == OnUnknownFormat::Warn
                    || BARE_EXTENSION.is_match(file.trim())
                {
                    warn!(
                        "included file {}/{} is not a recognized file type",
                        relative_base, file
                    );
                }
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let (_, change_sets, preconditions) = child.into_parts();
        let merged = document
            .take_preconditions()
            .merged(preconditions.into_container());
        document.set_preconditions(merged);
        for change_set in change_sets {
            document.add_change_set(change_set)?;
        }
        Ok(true)
    }

    /// Resolve every matching resource under a directory into `document`,
    /// in comparator order.
    pub fn include_all(
        &mut self,
        document: &mut ChangelogDocument,
        directive: &IncludeAllDirective,
        ctx: &ResolutionContext,
    ) -> Result<()> {
        let mut path = directive.path.replace('\\', "/");
        if !path.is_empty() && !path.ends_with('/') {
            path.push('/');
        }
        debug!("includeAll for {}", path);
        debug!("Using {} for includeAll", self.accessor.describe());

        let relative_to = directive
            .relative_to_changelog_file
            .then(|| document.header().physical_path().to_string());

        let listed = match self
            .accessor
            .list(relative_to.as_deref(), &path, true, true, false)
        {
            Ok(listed) => listed,
            Err(source) if directive.error_if_missing_or_empty => {
                return Err(Error::ResourceListing { path, source });
            }
            Err(source) => {
                debug!("Ignoring listing failure for {}: {}", path, source);
                BTreeSet::new()
            }
        };

        let mut resources: Vec<String> = listed
            .into_iter()
            .filter(|resource| match &directive.filter {
                Some(filter) => filter.include(resource),
                None => true,
            })
            .collect();
        resources.sort_by(|a, b| directive.comparator.compare(a, b));
        resources.dedup_by(|a, b| directive.comparator.compare(a, b) == Ordering::Equal);

        if resources.is_empty() && directive.error_if_missing_or_empty {
            return Err(Error::Setup {
                message: format!(
                    "Could not find directory or directory was empty for includeAll '{}'",
                    path
                ),
            });
        }

        for resource in resources {
            info!("Reading resource: {}", resource);
            let include = IncludeDirective::new(&resource)
                .with_scope(directive.scope.clone())
                .with_on_unknown_format(OnUnknownFormat::Warn);
            self.include(document, &include, ctx)
                .map_err(|source| Error::Include {
                    path: resource.clone(),
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }
}
