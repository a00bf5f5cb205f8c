//! # Changelog Resolver
//!
//! This library resolves a root changelog document of a database migration
//! tool into one ordered sequence of changesets. Documents pull in further
//! documents with `include` and `includeAll`; the resolver discovers and
//! parses them recursively, expands `${...}` parameters, drops changesets
//! that do not apply to the target database, merges precondition trees and
//! keeps `runOrder` hints honored across the whole tree.
//!
//! ## Quick Example
//!
//! ```
//! use changelog_resolver::changelog::Resolver;
//! use changelog_resolver::filesystem::MemoryFS;
//! use changelog_resolver::filter::RuntimeEnvironment;
//! use changelog_resolver::parameters::ChangelogParameters;
//! use changelog_resolver::parser::ParserRegistry;
//! use changelog_resolver::resource::{MemoryResourceAccessor, ResourcePlugins};
//!
//! let mut fs = MemoryFS::new();
//! fs.add_file_string(
//!     "db/changelog.yaml",
//!     "databaseChangeLog:\n  - include: {file: db/tables.yaml}\n  - changeSet: {id: late, author: ops, runOrder: last}\n",
//! )
//! .unwrap();
//! fs.add_file_string(
//!     "db/tables.yaml",
//!     "databaseChangeLog:\n  - changeSet: {id: person, author: alice}\n",
//! )
//! .unwrap();
//!
//! let parsers = ParserRegistry::with_defaults();
//! let accessor = MemoryResourceAccessor::new(fs);
//! let plugins = ResourcePlugins::new();
//! let parameters = ChangelogParameters::new(RuntimeEnvironment::new().with_database_type("h2"));
//!
//! let mut resolver = Resolver::new(&parsers, &accessor, &plugins, parameters);
//! let root = resolver.resolve("db/changelog.yaml").unwrap();
//!
//! let ids: Vec<&str> = root.change_sets().iter().map(|cs| cs.id()).collect();
//! assert_eq!(ids, vec!["person", "late"]);
//! ```
//!
//! ## Core Concepts
//!
//! - **Paths (`path`)**: Virtual path normalization and relative resolution.
//! - **Resources (`resource`, `filesystem`)**: Listing and reading changelog
//!   files through an accessor, plus the filters and comparators `includeAll`
//!   uses.
//! - **Parsers (`parser`, `node`)**: Format-specific parsers producing a generic
//!   node tree.
//! - **Parameters (`parameters`, `filter`)**: Scoped `${...}` values and the
//!   context, label and dbms filters deciding where they apply.
//! - **Documents (`changelog`, `changeset`, `ordering`, `precondition`)**: The
//!   recursive resolution itself.
//! - **Settings (`settings`)**: The runtime a resolution is performed for.

pub mod changelog;
pub mod changeset;
pub mod error;
pub mod filesystem;
pub mod filter;
pub mod node;
pub mod ordering;
pub mod output;
pub mod parameters;
pub mod parser;
pub mod path;
pub mod precondition;
pub mod resource;
pub mod settings;

#[cfg(test)]
mod path_proptest;
