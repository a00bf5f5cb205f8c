//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which resolves a root
//! changelog without executing anything and reports problems in the result.
//!
//! ## Functionality
//!
//! - **Resolution**: Every include and includeAll is followed, so missing
//!   files, unknown formats and malformed documents are reported.
//! - **Duplicate Detection**: Two changesets with the same identity
//!   (`path::id::author`, compared case-insensitively) are an error.
//! - **Empty Changesets**: A changeset with no changes is a warning, which
//!   fails validation under `--strict`.

use anyhow::Result;
use clap::Args;
use std::collections::BTreeMap;

use changelog_resolver::changelog::ChangelogDocument;
use changelog_resolver::output::{OutputConfig, Status};
use changelog_resolver::path::normalize_path;

use super::{resolve_changelog, TargetArgs};

/// Validate a changelog and the documents it includes
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Root changelog file, as a path within the search path.
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Use strict validation (fail on warnings).
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub target: TargetArgs,
}

/// Identities declared more than once, with their number of occurrences, in
/// order of first appearance.
fn find_duplicates(document: &ChangelogDocument) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<(String, String, String), (usize, usize, String)> = BTreeMap::new();
    for (position, change_set) in document.change_sets().iter().enumerate() {
        let key = (
            normalize_path(change_set.file_path()).to_lowercase(),
            change_set.id().to_lowercase(),
            change_set.author().to_lowercase(),
        );
        counts
            .entry(key)
            .or_insert_with(|| (position, 0, change_set.to_string()))
            .1 += 1;
    }

    let mut duplicates: Vec<(usize, String, usize)> = counts
        .into_values()
        .filter(|(_, count, _)| *count > 1)
        .map(|(position, count, identity)| (position, identity, count))
        .collect();
    duplicates.sort();
    duplicates
        .into_iter()
        .map(|(_, identity, count)| (identity, count))
        .collect()
}

/// Execute the `validate` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    println!("{} Validating changelog: {}", out.marker(Status::Info), args.file);

    let settings = args.target.load_settings()?;
    let document = match resolve_changelog(&args.file, &settings) {
        Ok(document) => {
            println!("{} Changelog resolved successfully", out.marker(Status::Ok));
            document
        }
        Err(e) => {
            println!("{} Resolution failed: {:#}", out.marker(Status::Error), e);
            return Err(anyhow::anyhow!("Resolution failed: {}", e));
        }
    };

    let mut has_warnings = false;
    let mut has_errors = false;

    let documents: std::collections::BTreeSet<String> = document
        .change_sets()
        .iter()
        .map(|cs| cs.changelog().file_path())
        .collect();
    println!("\n{} Changelog Summary:", out.marker(Status::Info));
    println!("   Changesets: {}", document.change_sets().len());
    println!("   Documents contributing changesets: {}", documents.len());
    println!("   Changelog preconditions: {}", document.preconditions().len());

    for (identity, count) in find_duplicates(&document) {
        println!(
            "{} Duplicate changeset {} declared {} times",
            out.marker(Status::Error),
            identity,
            count
        );
        has_errors = true;
    }

    for change_set in document.change_sets() {
        if change_set.changes().is_empty() {
            println!(
                "{} Changeset {} has no changes",
                out.marker(Status::Warn),
                change_set
            );
            has_warnings = true;
        }
    }

    if has_errors {
        println!("\n{} Validation failed", out.marker(Status::Error));
        return Err(anyhow::anyhow!("Validation failed"));
    }
    if has_warnings && args.strict {
        println!(
            "\n{} Validation failed (strict mode, warnings present)",
            out.marker(Status::Error)
        );
        return Err(anyhow::anyhow!("Validation failed in strict mode"));
    }

    println!("\n{} Validation passed", out.marker(Status::Ok));
    Ok(())
}
