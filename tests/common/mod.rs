//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new().with_file("changelog.yaml", changelogs::MINIMAL);
//! fixture.command().arg("resolve").arg("changelog.yaml").assert().success();
//! ```

use assert_fs::prelude::*;
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::changelogs;
    pub use super::TestFixture;
}

/// Changelog snippets shared by several suites.
#[allow(dead_code)]
pub mod changelogs {
    /// One changeset, no includes.
    pub const MINIMAL: &str = r#"
databaseChangeLog:
  - changeSet:
      id: create-person
      author: alice
      createTable: {tableName: person}
"#;

    /// Root that pulls a relative include and an includeAll directory.
    pub const ROOT_WITH_INCLUDES: &str = r#"
databaseChangeLog:
  - property: {name: schema, value: app}
  - changeSet:
      id: finish
      author: ops
      runOrder: last
      sql: {sql: "analyze"}
  - include: {file: tables/person.yaml, relativeToChangelogFile: true}
  - includeAll: {path: changes, relativeToChangelogFile: true}
"#;

    /// Target of `ROOT_WITH_INCLUDES`' include.
    pub const PERSON: &str = r#"
databaseChangeLog:
  - changeSet:
      id: "${schema}-person"
      author: alice
      createTable: {tableName: person}
"#;

    /// A formatted SQL changelog.
    pub fn sql(author: &str, id: &str) -> String {
        format!(
            "--liquibase formatted sql\n\n--changeset {}:{}\ncreate table {} (id int);\n",
            author, id, id
        )
    }

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "databaseChangeLog: [unclosed\n";
}

/// A temporary directory populated with changelog files.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a command configured to run in this fixture's directory.
    #[allow(dead_code)]
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("changelog-resolver");
        cmd.current_dir(self.path()).arg("--color").arg("never");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
