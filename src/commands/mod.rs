//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `changelog-resolver` command-line tool. Each subcommand is defined in its
//! own file.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments, derived
//!   using `clap`. All of them flatten the shared [`TargetArgs`].
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `changelog_resolver` library.
//!
//! Changelog paths given on the command line are virtual paths, looked up in
//! the search path (the current directory unless configured otherwise).

pub mod resolve;
pub mod tree;
pub mod validate;

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use changelog_resolver::changelog::{ChangelogDocument, Resolver};
use changelog_resolver::parser::ParserRegistry;
use changelog_resolver::settings::{self, ResolveSettings};

/// Options describing the target a changelog is resolved for.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Settings file with the database type, contexts, parameters and filters.
    #[arg(short, long, value_name = "FILE", env = "CHANGELOG_RESOLVER_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Target database short name (overrides the settings file).
    #[arg(long, value_name = "NAME")]
    pub database_type: Option<String>,

    /// Runtime context; may be repeated.
    #[arg(long = "context", value_name = "CONTEXT")]
    pub contexts: Vec<String>,

    /// Runtime label expression.
    #[arg(long, value_name = "EXPR")]
    pub label_filter: Option<String>,

    /// Global parameter definition; may be repeated.
    #[arg(short = 'D', long = "define", value_name = "NAME=VALUE", value_parser = parse_definition)]
    pub definitions: Vec<(String, String)>,

    /// Directory searched for changelog resources; may be repeated.
    #[arg(long = "search-path", value_name = "DIR")]
    pub search_path: Vec<PathBuf>,
}

fn parse_definition(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", raw)),
    }
}

impl TargetArgs {
    /// The settings file (if any) with the command-line flags layered on top.
    pub fn load_settings(&self) -> Result<ResolveSettings> {
        let mut settings = match &self.settings {
            Some(path) => settings::from_file(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => ResolveSettings::default(),
        };

        if let Some(database_type) = &self.database_type {
            settings = settings.with_database_type(database_type);
        }
        if let Some(labels) = &self.label_filter {
            settings = settings.with_labels(labels);
        }
        settings = settings.with_contexts(self.contexts.iter().cloned());
        for (name, value) in &self.definitions {
            settings = settings.with_parameter(name, value);
        }
        if !self.search_path.is_empty() {
            settings.search_path = self.search_path.clone();
        }
        Ok(settings)
    }
}

/// Resolve one root changelog with its own resolver.
pub fn resolve_changelog(path: &str, settings: &ResolveSettings) -> Result<ChangelogDocument> {
    let parsers = ParserRegistry::with_defaults();
    let accessor = settings.accessor(&std::env::current_dir()?);
    let plugins = settings.plugins()?;
    let parameters = settings.parameters()?;

    let mut resolver = Resolver::new(&parsers, &accessor, &plugins, parameters);
    resolver
        .resolve(path)
        .with_context(|| format!("Failed to resolve {}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_definition() {
        assert_eq!(
            parse_definition("schema=app").unwrap(),
            ("schema".to_string(), "app".to_string())
        );
        assert_eq!(
            parse_definition("url=a=b").unwrap(),
            ("url".to_string(), "a=b".to_string())
        );
        assert!(parse_definition("novalue").is_err());
        assert!(parse_definition("=x").is_err());
    }

    #[test]
    fn test_flags_layer_over_settings_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, "database-type: h2\ncontexts: [dev]\nsearch-path: [db]\n").unwrap();

        let args = TargetArgs {
            settings: Some(path),
            database_type: Some("postgresql".to_string()),
            contexts: vec!["qa".to_string()],
            definitions: vec![("schema".to_string(), "app".to_string())],
            search_path: vec![PathBuf::from("other")],
            ..TargetArgs::default()
        };
        let settings = args.load_settings().unwrap();
        assert_eq!(settings.database_type.as_deref(), Some("postgresql"));
        assert_eq!(settings.contexts, vec!["dev", "qa"]);
        assert_eq!(settings.search_path, vec![PathBuf::from("other")]);
        assert_eq!(
            settings.parameters().unwrap().value("schema", None),
            Some("app")
        );
    }

    #[test]
    fn test_missing_settings_file() {
        let args = TargetArgs {
            settings: Some(PathBuf::from("/nonexistent/settings.yaml")),
            ..TargetArgs::default()
        };
        let err = args.load_settings().unwrap_err();
        assert!(err.to_string().contains("Failed to load settings"));
    }
}
