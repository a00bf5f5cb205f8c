//! Virtual path utilities for changelog identity and include resolution
//!
//! Paths handled here are virtual: they name resources inside a resource
//! accessor, not files on the host. `normalize_path` produces the canonical
//! form used for identity comparisons only and must never be used to open a
//! resource.

use regex::Regex;
use std::sync::LazyLock;

/// Scheme prefix used by classpath-style resource locations.
pub const CLASSPATH_PREFIX: &str = "classpath:";

static DOUBLE_SLASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("//+").expect("double slash pattern is valid"));
static SLASH_DOT_SLASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\./").expect("slash dot slash pattern is valid"));
static DRIVE_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-zA-Z]:").expect("drive letter pattern is valid"));
static LEADING_DOT_SLASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.?/").expect("leading dot slash pattern is valid"));

/// Single pass of the normalization transform.
fn normalize_once(path: &str) -> String {
    let path = path.strip_prefix(CLASSPATH_PREFIX).unwrap_or(path);
    let path = path.replace('\\', "/");
    let path = DOUBLE_SLASH.replace_all(&path, "/");
    let path = SLASH_DOT_SLASH.replace_all(&path, "/");
    let path = DRIVE_LETTER.replace(&path, "");
    LEADING_DOT_SLASH.replace(&path, "").into_owned()
}

/// Produce the canonical, comparable form of a virtual path.
///
/// Strips a leading `classpath:` scheme, converts backslashes, collapses
/// repeated slashes and `/./` segments, drops a leading drive letter and a
/// single leading `/` or `./`. The transform is repeated until it reaches a
/// fixed point, so `normalize_path(normalize_path(p)) == normalize_path(p)`.
/// Case is preserved.
///
/// # Examples
///
/// ```
/// use changelog_resolver::path::normalize_path;
///
/// assert_eq!(normalize_path("classpath:db\\changes//a.yaml"), "db/changes/a.yaml");
/// assert_eq!(normalize_path("C:/db/./a.yaml"), "db/a.yaml");
/// ```
pub fn normalize_path(path: &str) -> String {
    let mut current = path.to_string();
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Remove the first `classpath:` occurrence from a path.
pub fn strip_classpath(path: &str) -> String {
    path.replacen(CLASSPATH_PREFIX, "", 1)
}

/// Display form of a path: backslashes converted and one leading slash
/// removed.
pub fn logical_form(path: &str) -> String {
    let path = path.replace('\\', "/");
    match path.strip_prefix('/') {
        Some(stripped) => stripped.to_string(),
        None => path,
    }
}

/// Directory component of a path, including the trailing separator.
///
/// Returns an empty string when the path has no directory component.
pub fn directory_of(path: &str) -> String {
    let path = path.replace('\\', "/");
    match path.rfind('/') {
        Some(idx) => path[..=idx].to_string(),
        None => String::new(),
    }
}

/// Resolve `name` against the directory `base`.
///
/// An absolute `name` is returned as-is. `.` segments are dropped and `..`
/// segments consume the preceding segment where one exists.
pub fn concat(base: &str, name: &str) -> String {
    let name = name.replace('\\', "/");
    if name.starts_with('/') {
        return resolve_dots(&name);
    }

    let base = base.replace('\\', "/");
    if base.is_empty() {
        return resolve_dots(&name);
    }
    if base.ends_with('/') {
        resolve_dots(&format!("{}{}", base, name))
    } else {
        resolve_dots(&format!("{}/{}", base, name))
    }
}

fn resolve_dots(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Whether any segment of the path is a version-control artifact directory
/// (`.svn` or `cvs`, case-insensitive).
pub fn is_vcs_artifact(path: &str) -> bool {
    path.split(['/', '\\'])
        .any(|segment| segment.eq_ignore_ascii_case(".svn") || segment.eq_ignore_ascii_case("cvs"))
}
