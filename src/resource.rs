//! # Resource Access
//!
//! Changelogs never touch the host filesystem directly. Everything goes
//! through a `ResourceAccessor`, which lists and opens resources by virtual
//! path. Two implementations are provided:
//!
//! - **`MemoryResourceAccessor`**: serves a `MemoryFS`, used by tests and by
//!   hosts that embed their changelogs.
//! - **`DirectoryResourceAccessor`**: serves one or more directories on disk,
//!   searched in order, so a changelog tree can be split across search roots.
//!
//! `includeAll` also needs to filter and order the resources it lists. Those
//! capabilities are expressed by the `IncludeAllFilter` and
//! `ResourceComparator` traits and looked up by name in a `ResourcePlugins`
//! registry that the host application populates.

use crate::error::{Error, Result};
use crate::filesystem::MemoryFS;
use crate::path::{concat, directory_of, strip_classpath};
use glob::Pattern;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Lists and opens resources by virtual path.
pub trait ResourceAccessor: Send + Sync {
    /// List resources under `path`.
    ///
    /// When `relative_to` is given, `path` is resolved against the directory
    /// of that resource. Returned paths are full virtual paths. A missing
    /// directory is an error.
    fn list(
        &self,
        relative_to: Option<&str>,
        path: &str,
        recursive: bool,
        include_files: bool,
        include_dirs: bool,
    ) -> io::Result<BTreeSet<String>>;

    /// Read a resource. `Ok(None)` means it does not exist.
    fn open(&self, relative_to: Option<&str>, path: &str) -> io::Result<Option<Vec<u8>>>;

    /// Short description for log output.
    fn describe(&self) -> String;
}

/// Resolve a (possibly relative) virtual path the way every accessor does.
pub fn resolve_virtual(relative_to: Option<&str>, path: &str) -> String {
    match relative_to {
        Some(base) => concat(&directory_of(&strip_classpath(base)), &strip_classpath(path)),
        None => strip_classpath(path),
    }
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("directory not found: {}", path),
    )
}

/// Serves resources from an in-memory filesystem.
#[derive(Debug, Clone, Default)]
pub struct MemoryResourceAccessor {
    fs: MemoryFS,
}

impl MemoryResourceAccessor {
    pub fn new(fs: MemoryFS) -> Self {
        Self { fs }
    }

    pub fn fs(&self) -> &MemoryFS {
        &self.fs
    }
}

impl ResourceAccessor for MemoryResourceAccessor {
    fn list(
        &self,
        relative_to: Option<&str>,
        path: &str,
        recursive: bool,
        include_files: bool,
        include_dirs: bool,
    ) -> io::Result<BTreeSet<String>> {
        let dir = resolve_virtual(relative_to, path);
        let dir = dir.trim_start_matches('/');
        if !dir.is_empty() && !self.fs.is_dir(dir) {
            return Err(not_found(dir));
        }

        let mut found = BTreeSet::new();
        if include_files {
            found.extend(self.fs.list_under(dir, recursive));
        }
        if include_dirs {
            found.extend(self.fs.list_dirs_under(dir, recursive));
        }
        Ok(found)
    }

    fn open(&self, relative_to: Option<&str>, path: &str) -> io::Result<Option<Vec<u8>>> {
        let resolved = resolve_virtual(relative_to, path);
        Ok(self.fs.get_file(&resolved).map(|file| file.content.clone()))
    }

    fn describe(&self) -> String {
        format!("memory ({} resources)", self.fs.len())
    }
}

/// Serves resources from directories on disk, searched in order.
#[derive(Debug, Clone)]
pub struct DirectoryResourceAccessor {
    roots: Vec<PathBuf>,
}

impl DirectoryResourceAccessor {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

/// Virtual path of `path` relative to `root`, with forward slashes.
fn virtual_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

impl ResourceAccessor for DirectoryResourceAccessor {
    fn list(
        &self,
        relative_to: Option<&str>,
        path: &str,
        recursive: bool,
        include_files: bool,
        include_dirs: bool,
    ) -> io::Result<BTreeSet<String>> {
        let dir = resolve_virtual(relative_to, path);
        let dir = dir.trim_start_matches('/');
        let mut found = BTreeSet::new();
        let mut any_root = false;

        for root in &self.roots {
            let target = root.join(dir);
            if !target.is_dir() {
                continue;
            }
            any_root = true;

            let mut walker = WalkDir::new(&target).min_depth(1).sort_by_file_name();
            if !recursive {
                walker = walker.max_depth(1);
            }
            for entry in walker {
                let entry = entry.map_err(io::Error::other)?;
                let wanted = (include_files && entry.file_type().is_file())
                    || (include_dirs && entry.file_type().is_dir());
                if !wanted {
                    continue;
                }
                if let Some(mut virtual_path) = virtual_path(root, entry.path()) {
                    if entry.file_type().is_dir() {
                        virtual_path.push('/');
                    }
                    found.insert(virtual_path);
                }
            }
        }

        if !any_root {
            return Err(not_found(dir));
        }
        Ok(found)
    }

    fn open(&self, relative_to: Option<&str>, path: &str) -> io::Result<Option<Vec<u8>>> {
        let resolved = resolve_virtual(relative_to, path);
        let resolved = resolved.trim_start_matches('/');
        for root in &self.roots {
            let candidate = root.join(resolved);
            if candidate.is_file() {
                return std::fs::read(&candidate).map(Some);
            }
        }
        Ok(None)
    }

    fn describe(&self) -> String {
        let roots: Vec<String> = self
            .roots
            .iter()
            .map(|root| root.display().to_string())
            .collect();
        format!("directories [{}]", roots.join(", "))
    }
}

/// Decides whether an `includeAll` resource is included.
pub trait IncludeAllFilter: Send + Sync {
    fn include(&self, path: &str) -> bool;
}

/// Orders `includeAll` resources. Resources comparing equal are deduplicated.
pub trait ResourceComparator: Send + Sync {
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

/// Packaging prefix ignored by the standard comparator.
pub const PACKAGED_CLASSES_PREFIX: &str = "WEB-INF/classes/";

/// Default `includeAll` ordering: plain string order after removing the
/// `WEB-INF/classes/` packaging prefix, so exploded and archived deployments
/// sort identically.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardComparator;

impl ResourceComparator for StandardComparator {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.replace(PACKAGED_CLASSES_PREFIX, "")
            .cmp(&b.replace(PACKAGED_CLASSES_PREFIX, ""))
    }
}

/// Includes resources whose path matches a glob pattern.
#[derive(Debug, Clone)]
pub struct GlobFilter {
    pattern: Pattern,
}

impl GlobFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: Pattern::new(pattern).map_err(Error::Glob)?,
        })
    }
}

impl IncludeAllFilter for GlobFilter {
    fn include(&self, path: &str) -> bool {
        self.pattern.matches(path)
    }
}

/// Includes resources ending in one of the given extensions
/// (case-insensitive, without the dot).
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
}

impl ExtensionFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }
}

impl IncludeAllFilter for ExtensionFilter {
    fn include(&self, path: &str) -> bool {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        match file_name.rsplit_once('.') {
            Some((_, ext)) => self
                .extensions
                .iter()
                .any(|wanted| wanted.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }
}

/// Named filters and comparators that `includeAll` nodes refer to.
#[derive(Clone, Default)]
pub struct ResourcePlugins {
    filters: HashMap<String, Arc<dyn IncludeAllFilter>>,
    comparators: HashMap<String, Arc<dyn ResourceComparator>>,
}

impl ResourcePlugins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_filter(&mut self, name: &str, filter: Arc<dyn IncludeAllFilter>) {
        self.filters.insert(name.to_string(), filter);
    }

    pub fn register_comparator(&mut self, name: &str, comparator: Arc<dyn ResourceComparator>) {
        self.comparators.insert(name.to_string(), comparator);
    }

    pub fn filter(&self, name: &str) -> Option<Arc<dyn IncludeAllFilter>> {
        self.filters.get(name).cloned()
    }

    pub fn comparator(&self, name: &str) -> Option<Arc<dyn ResourceComparator>> {
        self.comparators.get(name).cloned()
    }
}

impl fmt::Debug for ResourcePlugins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut filters: Vec<&String> = self.filters.keys().collect();
        let mut comparators: Vec<&String> = self.comparators.keys().collect();
        filters.sort();
        comparators.sort();
        f.debug_struct("ResourcePlugins")
            .field("filters", &filters)
            .field("comparators", &comparators)
            .finish()
    }
}
