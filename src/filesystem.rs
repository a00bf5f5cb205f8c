//! In-memory virtual filesystem used as a changelog resource store
//!
//! Keys are virtual paths with forward slashes and no leading slash, the same
//! shape the resource accessors hand out. `MemoryFS` is what
//! `MemoryResourceAccessor` serves from, which makes it the natural fixture
//! for tests and for embedding changelogs directly in a host application.

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// A stored resource
#[derive(Debug, Clone)]
pub struct File {
    /// File content as bytes
    pub content: Vec<u8>,
}

impl File {
    /// Create a new file with content
    pub fn new(content: Vec<u8>) -> Self {
        Self { content }
    }

    /// Create a new file from string content
    pub fn from_string(content: &str) -> Self {
        Self::new(content.as_bytes().to_vec())
    }

    /// Get file size in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// In-memory filesystem keyed by virtual path, iterated in path order
#[derive(Debug, Clone, Default)]
pub struct MemoryFS {
    files: BTreeMap<String, File>,
}

/// Canonical key for a virtual path.
fn key_for(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.trim_start_matches('/').to_string()
}

impl MemoryFS {
    /// Create a new empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a file
    pub fn add_file(&mut self, path: &str, file: File) -> Result<()> {
        let key = key_for(path);
        if key.is_empty() || key.ends_with('/') {
            return Err(Error::Setup {
                message: format!("Invalid resource path: '{}'", path),
            });
        }
        self.files.insert(key, file);
        Ok(())
    }

    /// Add a file with string content
    pub fn add_file_string(&mut self, path: &str, content: &str) -> Result<()> {
        self.add_file(path, File::from_string(content))
    }

    /// Get a file by path
    pub fn get_file(&self, path: &str) -> Option<&File> {
        self.files.get(&key_for(path))
    }

    /// Check if a file exists
    pub fn exists(&self, path: &str) -> bool {
        self.files.contains_key(&key_for(path))
    }

    /// Whether any file lives under `dir`.
    pub fn is_dir(&self, dir: &str) -> bool {
        let prefix = dir_prefix(dir);
        !prefix.is_empty() && self.files.keys().any(|path| path.starts_with(&prefix))
    }

    /// List all file paths in order
    pub fn list_files(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    /// List files below `dir`, either direct children only or the whole
    /// subtree.
    pub fn list_under(&self, dir: &str, recursive: bool) -> Vec<String> {
        let prefix = dir_prefix(dir);
        self.files
            .keys()
            .filter(|path| path.starts_with(&prefix))
            .filter(|path| recursive || !path[prefix.len()..].contains('/'))
            .cloned()
            .collect()
    }

    /// List the directories below `dir` that contain at least one file.
    pub fn list_dirs_under(&self, dir: &str, recursive: bool) -> Vec<String> {
        let prefix = dir_prefix(dir);
        let mut dirs = Vec::new();
        for path in self.files.keys().filter(|path| path.starts_with(&prefix)) {
            let rest = &path[prefix.len()..];
            let mut end = 0;
            while let Some(idx) = rest[end..].find('/') {
                end += idx + 1;
                let candidate = format!("{}{}", prefix, &rest[..end]);
                if !dirs.contains(&candidate) {
                    dirs.push(candidate);
                }
                if !recursive {
                    break;
                }
            }
        }
        dirs.sort();
        dirs
    }

    /// Get the number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if filesystem is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over all files as (path, file) pairs
    pub fn files(&self) -> impl Iterator<Item = (&String, &File)> {
        self.files.iter()
    }
}

fn dir_prefix(dir: &str) -> String {
    let key = key_for(dir);
    if key.is_empty() || key.ends_with('/') {
        key
    } else {
        format!("{}/", key)
    }
}
