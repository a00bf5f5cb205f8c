//! # Tree Command Implementation
//!
//! This module implements the `tree` subcommand, which resolves a root
//! changelog and displays its changesets grouped by the document that
//! declared them.
//!
//! Documents appear in the order their first changeset runs in, and
//! changesets keep their resolved order within each document. This command is
//! a read-only operation.

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};

use changelog_resolver::changelog::ChangelogDocument;

use super::{resolve_changelog, TargetArgs};

/// Display the resolved changesets grouped by owning document
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Root changelog file, as a path within the search path.
    #[arg(value_name = "FILE")]
    pub file: String,

    #[command(flatten)]
    pub target: TargetArgs,
}

/// Execute the `tree` command.
pub fn execute(args: TreeArgs) -> Result<()> {
    println!("🌳 Changelog tree for: {}", args.file);

    let settings = args.target.load_settings()?;
    let document = resolve_changelog(&args.file, &settings)?;

    let tree_root = build_tree(&document);
    print_tree(&tree_root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;

    Ok(())
}

/// Root node labelled with the root changelog, one child per owning document.
fn build_tree(document: &ChangelogDocument) -> TreeNode {
    let mut groups: Vec<TreeNode> = Vec::new();

    for change_set in document.change_sets() {
        let owner = change_set.changelog().file_path();
        let leaf = TreeNode {
            label: format!("{} by {}", change_set.id(), change_set.author()),
            children: vec![],
        };
        match groups.iter_mut().find(|group| group.label == owner) {
            Some(group) => group.children.push(leaf),
            None => groups.push(TreeNode {
                label: owner,
                children: vec![leaf],
            }),
        }
    }

    TreeNode {
        label: document.file_path(),
        children: groups,
    }
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}
