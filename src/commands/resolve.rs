//! # Resolve Command Implementation
//!
//! Resolves one or more root changelogs and prints the final, ordered list of
//! changesets of each. Root changelogs are independent resolutions and run in
//! parallel, one resolver per root.

use anyhow::Result;
use clap::Args;
use rayon::prelude::*;

use changelog_resolver::changelog::ChangelogDocument;
use changelog_resolver::changeset::ChangeSet;
use changelog_resolver::ordering::RunOrdered;
use changelog_resolver::output::{OutputConfig, Status};

use super::{resolve_changelog, TargetArgs};

/// Resolve changelogs and print their ordered changesets
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Root changelog files, as paths within the search path.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<String>,

    #[command(flatten)]
    pub target: TargetArgs,
}

/// One report line for a changeset: identity, then run order and dbms if set.
pub(crate) fn format_change_set(change_set: &ChangeSet) -> String {
    let mut line = change_set.to_string();
    if let Some(run_order) = change_set.run_order() {
        line.push_str(&format!(" (runOrder: {})", run_order));
    }
    if !change_set.dbms().is_empty() {
        let dbms: Vec<&str> = change_set.dbms().iter().map(String::as_str).collect();
        line.push_str(&format!(" (dbms: {})", dbms.join(",")));
    }
    line
}

/// Execute the `resolve` command.
///
/// Every root is reported, even when another one failed; the command fails if
/// any root did.
pub fn execute(args: ResolveArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let settings = args.target.load_settings()?;

    let results: Vec<(String, Result<ChangelogDocument>)> = args
        .files
        .par_iter()
        .map(|file| (file.clone(), resolve_changelog(file, &settings)))
        .collect();

    let mut failures = 0;
    for (file, result) in results {
        match result {
            Ok(document) => {
                println!(
                    "{} {} ({} changesets)",
                    out.marker(Status::Info),
                    file,
                    document.change_sets().len()
                );
                for change_set in document.change_sets() {
                    println!("   {}", format_change_set(change_set));
                }
            }
            Err(e) => {
                println!("{} {}: {:#}", out.marker(Status::Error), file, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(anyhow::anyhow!(
            "{} of {} changelogs failed to resolve",
            failures,
            args.files.len()
        ));
    }
    Ok(())
}
