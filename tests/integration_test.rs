//! Integration tests for changelog resolution against changelog trees on disk.
//!
//! These tests drive the library through `DirectoryResourceAccessor`, the way
//! the CLI does, and cover behavior that spans several modules: include
//! linkage, includeAll directory scanning, parameter flow between documents,
//! history lookups and independent resolutions running concurrently.

mod common;

use changelog_resolver::changelog::{ChangelogDocument, Resolver};
use changelog_resolver::changeset::RanChangeSet;
use changelog_resolver::error::{Error, ErrorKind};
use changelog_resolver::filter::RuntimeEnvironment;
use changelog_resolver::parameters::ChangelogParameters;
use changelog_resolver::parser::ParserRegistry;
use changelog_resolver::resource::{DirectoryResourceAccessor, ResourcePlugins};
use changelog_resolver::settings;
use common::changelogs;
use common::TestFixture;
use std::sync::Arc;

fn resolve_in(
    fixture: &TestFixture,
    runtime: RuntimeEnvironment,
    path: &str,
) -> Result<ChangelogDocument, Error> {
    let parsers = ParserRegistry::with_defaults();
    let accessor = DirectoryResourceAccessor::new([fixture.path()]);
    let plugins = ResourcePlugins::new();
    let mut resolver = Resolver::new(&parsers, &accessor, &plugins, ChangelogParameters::new(runtime));
    resolver.resolve(path)
}

fn identities(document: &ChangelogDocument) -> Vec<String> {
    document
        .change_sets()
        .iter()
        .map(|change_set| change_set.to_string())
        .collect()
}

fn tree_fixture() -> TestFixture {
    TestFixture::new()
        .with_file("db/changelog.yaml", changelogs::ROOT_WITH_INCLUDES)
        .with_file("db/tables/person.yaml", changelogs::PERSON)
        .with_file("db/changes/002-index.sql", &changelogs::sql("bob", "idx"))
        .with_file("db/changes/001-audit.sql", &changelogs::sql("bob", "audit"))
        .with_file("db/changes/notes.md", "# not a changelog\n")
}

#[test]
fn test_resolve_tree_from_directory() {
    let fixture = tree_fixture();
    let document = resolve_in(&fixture, RuntimeEnvironment::new(), "db/changelog.yaml").unwrap();

    assert_eq!(
        identities(&document),
        vec![
            "db/tables/person.yaml::app-person::alice",
            "db/changes/001-audit.sql::audit::bob",
            "db/changes/002-index.sql::idx::bob",
            "db/changelog.yaml::finish::ops",
        ]
    );

    for change_set in document.change_sets() {
        let root = change_set.changelog().root().unwrap();
        assert!(Arc::ptr_eq(&root, document.header()));
    }
    let person = document.change_sets()[0].changelog();
    assert!(Arc::ptr_eq(&person.parent().unwrap(), document.header()));
    assert!(document.header().parent().is_none());
}

#[test]
fn test_missing_include_names_the_chain() {
    let fixture = TestFixture::new().with_file(
        "changelog.yaml",
        "databaseChangeLog:\n  - include: {file: missing.yaml}\n",
    );
    let err = resolve_in(&fixture, RuntimeEnvironment::new(), "changelog.yaml").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Setup);
    assert!(matches!(err, Error::Include { ref path, .. } if path == "missing.yaml"));
    assert!(format!("{}", err.root_cause()).contains("missing.yaml does not exist"));
}

#[test]
fn test_malformed_included_document() {
    let fixture = TestFixture::new()
        .with_file("changelog.yaml", "databaseChangeLog:\n  - include: {file: bad.yaml}\n")
        .with_file("bad.yaml", changelogs::INVALID_YAML);
    let err = resolve_in(&fixture, RuntimeEnvironment::new(), "changelog.yaml").unwrap_err();
    assert_eq!(err.root_cause().kind(), ErrorKind::Malformed);
}

#[test]
fn test_database_type_filters_changesets_across_documents() {
    let fixture = TestFixture::new()
        .with_file(
            "changelog.yaml",
            r#"
databaseChangeLog:
  - changeSet: {id: everywhere, author: x}
  - include: {file: vendor.yaml}
"#,
        )
        .with_file(
            "vendor.yaml",
            r#"
databaseChangeLog:
  - changeSet: {id: pg-only, author: x, dbms: postgresql}
  - changeSet: {id: not-h2, author: x, dbms: "!h2"}
"#,
        );

    let h2 = resolve_in(
        &fixture,
        RuntimeEnvironment::new().with_database_type("h2"),
        "changelog.yaml",
    )
    .unwrap();
    assert_eq!(h2.change_sets().len(), 1);

    let pg = resolve_in(
        &fixture,
        RuntimeEnvironment::new().with_database_type("PostgreSQL"),
        "changelog.yaml",
    )
    .unwrap();
    assert_eq!(pg.change_sets().len(), 3);
}

#[test]
fn test_find_changeset_with_classpath_and_case_differences() {
    let fixture = tree_fixture();
    let parameters = ChangelogParameters::new(RuntimeEnvironment::new());
    let document = resolve_in(&fixture, RuntimeEnvironment::new(), "classpath:db/changelog.yaml")
        .unwrap();

    let found = document
        .find_changeset(&parameters, "classpath:/DB/Tables/person.yaml", "ALICE", "APP-person")
        .unwrap();
    assert_eq!(found.id(), "app-person");
    assert!(document
        .find_changeset(&parameters, "db/tables/person.yaml", "bob", "app-person")
        .is_none());

    let ran = RanChangeSet::new("db/changes/001-audit.sql", "bob", "audit")
        .with_stored_changelog("classpath:db/changes/001-audit.sql");
    let located = document.find_ran_changeset(&parameters, &ran).unwrap();
    assert_eq!(
        located.stored_file_path(),
        Some("classpath:db/changes/001-audit.sql")
    );
}

#[test]
fn test_settings_drive_resolution() {
    let fixture = TestFixture::new()
        .with_file(
            "db/changelog.yaml",
            r#"
databaseChangeLog:
  - includeAll: {path: changes, relativeToChangelogFile: true, filter: sql-only}
  - changeSet: {id: "${release}", author: x}
"#,
        )
        .with_file("db/changes/a.sql", &changelogs::sql("x", "a"))
        .with_file("db/changes/b.yaml", changelogs::MINIMAL);

    let settings = settings::parse(
        "parameters: {release: r1}\nfilters:\n  sql-only: \"**/*.sql\"\n",
    )
    .unwrap();

    let parsers = ParserRegistry::with_defaults();
    let accessor = settings.accessor(fixture.path());
    let plugins = settings.plugins().unwrap();
    let mut resolver = Resolver::new(&parsers, &accessor, &plugins, settings.parameters().unwrap());
    let document = resolver.resolve("db/changelog.yaml").unwrap();

    let ids: Vec<&str> = document.change_sets().iter().map(|cs| cs.id()).collect();
    assert_eq!(ids, vec!["a", "r1"]);
}

#[test]
fn test_independent_roots_resolve_concurrently() {
    let fixture = TestFixture::new()
        .with_file("one/root.yaml", "databaseChangeLog:\n  - include: {file: shared.yaml, relativeToChangelogFile: true}\n  - changeSet: {id: one, author: x}\n")
        .with_file("one/shared.yaml", "databaseChangeLog:\n  - changeSet: {id: s1, author: x}\n")
        .with_file("two/root.yaml", "databaseChangeLog:\n  - include: {file: shared.yaml, relativeToChangelogFile: true}\n  - changeSet: {id: two, author: x}\n")
        .with_file("two/shared.yaml", "databaseChangeLog:\n  - changeSet: {id: s2, author: x}\n");

    let parsers = ParserRegistry::with_defaults();
    let accessor = DirectoryResourceAccessor::new([fixture.path()]);
    let plugins = ResourcePlugins::new();

    let documents: Vec<ChangelogDocument> = std::thread::scope(|scope| {
        let handles: Vec<_> = ["one/root.yaml", "two/root.yaml"]
            .into_iter()
            .map(|root| {
                let (parsers, accessor, plugins) = (&parsers, &accessor, &plugins);
                scope.spawn(move || {
                    let mut resolver = Resolver::new(
                        parsers,
                        accessor,
                        plugins,
                        ChangelogParameters::new(RuntimeEnvironment::new()),
                    );
                    resolver.resolve(root).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(
        identities(&documents[0]),
        vec!["one/shared.yaml::s1::x", "one/root.yaml::one::x"]
    );
    assert_eq!(
        identities(&documents[1]),
        vec!["two/shared.yaml::s2::x", "two/root.yaml::two::x"]
    );
    for document in &documents {
        for change_set in document.change_sets() {
            let root = change_set.changelog().root().unwrap();
            assert!(Arc::ptr_eq(&root, document.header()));
        }
    }
}
