//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Changelog Resolver - Resolve migration changelogs into ordered changesets
#[derive(Parser, Debug)]
#[command(name = "changelog-resolver")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve changelogs and print their ordered changesets
    Resolve(commands::resolve::ResolveArgs),

    /// Display the resolved changesets grouped by owning document
    Tree(commands::tree::TreeArgs),

    /// Validate a changelog and the documents it includes
    Validate(commands::validate::ValidateArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Resolve(args) => commands::resolve::execute(args, &self.color),
            Commands::Tree(args) => commands::tree::execute(args),
            Commands::Validate(args) => commands::validate::execute(args, &self.color),
        }
    }
}

/// Route `log` records to stderr. `RUST_LOG` takes precedence over the flag.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A logger may already be installed when running inside tests.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "changelog-resolver",
            "resolve",
            "db/changelog.yaml",
            "--log-level",
            "debug",
            "--define",
            "schema=app",
            "--context",
            "dev",
            "--context",
            "test",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        assert_eq!(cli.color, "auto");
        match cli.command {
            Commands::Resolve(args) => {
                assert_eq!(args.files, vec!["db/changelog.yaml"]);
                assert_eq!(args.target.contexts, vec!["dev", "test"]);
                assert_eq!(
                    args.target.definitions,
                    vec![("schema".to_string(), "app".to_string())]
                );
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_resolve_requires_a_file() {
        assert!(Cli::try_parse_from(["changelog-resolver", "resolve"]).is_err());
    }
}
