//! End-to-end tests for the `tree` command.

mod common;
use common::prelude::*;

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_tree_groups_changesets_by_document() {
    let fixture = TestFixture::new()
        .with_file("db/changelog.yaml", changelogs::ROOT_WITH_INCLUDES)
        .with_file("db/tables/person.yaml", changelogs::PERSON)
        .with_file("db/changes/001-audit.sql", &changelogs::sql("bob", "audit"));

    fixture
        .command()
        .arg("tree")
        .arg("db/changelog.yaml")
        .assert()
        .success()
        .stdout(predicate::str::contains("Changelog tree for: db/changelog.yaml"))
        .stdout(predicate::str::contains("db/tables/person.yaml"))
        .stdout(predicate::str::contains("app-person by alice"))
        .stdout(predicate::str::contains("audit by bob"))
        .stdout(predicate::str::contains("finish by ops"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_tree_malformed_changelog() {
    let fixture = TestFixture::new().with_file("changelog.yaml", changelogs::INVALID_YAML);

    fixture
        .command()
        .arg("tree")
        .arg("changelog.yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to resolve changelog.yaml"));
}
