//! Root and parent linkage during recursive resolution
//!
//! A `ResolutionContext` travels down the call stack with every nested
//! parse. Each resolution builds its own chain of contexts, so two
//! resolutions running at the same time never see each other's documents
//! and nothing has to be restored when a nested parse returns or fails.

use super::ChangelogHeader;
use crate::filter::{ContextExpression, Labels};
use std::sync::{Arc, Weak};

/// Filters an `include` or `includeAll` directive stamps on the documents
/// it pulls in. They are recorded for execution-time filtering only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeScope {
    pub contexts: ContextExpression,
    pub labels: Labels,
    pub ignore: bool,
}

impl IncludeScope {
    pub fn new(contexts: Option<&str>, labels: Option<&str>, ignore: bool) -> Self {
        Self {
            contexts: ContextExpression::new(contexts),
            labels: Labels::new(labels),
            ignore,
        }
    }
}

/// Linkage visible to the document currently being built.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    root: Option<Weak<ChangelogHeader>>,
    parent: Option<Arc<ChangelogHeader>>,
    scope: IncludeScope,
}

impl ResolutionContext {
    /// Context of a top-level parse: no root, no parent, no include filters.
    pub fn top_level() -> Self {
        Self::default()
    }

    /// Context for a document included by `current`.
    ///
    /// The root is inherited when one is already established, otherwise
    /// `current` becomes the root of the whole descent. `current` is always
    /// the new parent.
    pub fn descend(&self, current: &Arc<ChangelogHeader>, scope: IncludeScope) -> Self {
        Self {
            root: Some(
                self.root
                    .clone()
                    .unwrap_or_else(|| Arc::downgrade(current)),
            ),
            parent: Some(Arc::clone(current)),
            scope,
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.root.is_none()
    }

    pub fn root(&self) -> Option<&Weak<ChangelogHeader>> {
        self.root.as_ref()
    }

    pub fn parent(&self) -> Option<&Arc<ChangelogHeader>> {
        self.parent.as_ref()
    }

    pub fn scope(&self) -> &IncludeScope {
        &self.scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_has_no_linkage() {
        let ctx = ResolutionContext::top_level();
        assert!(ctx.is_top_level());
        assert!(ctx.root().is_none());
        assert!(ctx.parent().is_none());
        assert_eq!(ctx.scope(), &IncludeScope::default());
    }

    #[test]
    fn test_descend_establishes_root_once() {
        let root = ChangelogHeader::detached("root.yaml");
        let child = ChangelogHeader::detached("child.yaml");

        let first = ResolutionContext::top_level().descend(&root, IncludeScope::default());
        let second = first.descend(&child, IncludeScope::new(Some("dev"), None, true));

        let first_root = first.root().and_then(Weak::upgrade).unwrap();
        let second_root = second.root().and_then(Weak::upgrade).unwrap();
        let second_parent = second.parent().unwrap();

        assert!(Arc::ptr_eq(&first_root, &root));
        assert!(Arc::ptr_eq(&second_root, &root));
        assert!(Arc::ptr_eq(second_parent, &child));
        assert!(second.scope().ignore);
        assert_eq!(second.scope().contexts.as_str(), "dev");
    }

    #[test]
    fn test_sibling_contexts_are_independent() {
        let root = ChangelogHeader::detached("root.yaml");
        let top = ResolutionContext::top_level();
        let a = top.descend(&root, IncludeScope::new(Some("a"), None, false));
        let b = top.descend(&root, IncludeScope::new(Some("b"), None, false));

        assert_eq!(a.scope().contexts.as_str(), "a");
        assert_eq!(b.scope().contexts.as_str(), "b");
        assert!(top.is_top_level());
    }
}
