//! # Changelog Parsers
//!
//! Parsers turn a changelog resource into the generic `ParsedNode` tree. They
//! know nothing about includes, parameters or ordering; the resolver takes
//! the tree from there.
//!
//! The `ParserRegistry` picks the highest-priority parser that supports a
//! path. A path no parser supports is an unknown format, which the include
//! resolver handles according to the include's policy.

pub mod sql;
pub mod yaml;

use crate::error::{Error, Result};
use crate::node::ParsedNode;
use crate::resource::ResourceAccessor;

pub use sql::FormattedSqlParser;
pub use yaml::{JsonParser, YamlParser};

/// Default priority of the built-in parsers.
pub const PRIORITY_DEFAULT: u32 = 1;

/// Turns a changelog resource into a parsed-node tree.
pub trait ChangelogParser: Send + Sync {
    /// Short name for log output.
    fn name(&self) -> &'static str;

    /// Higher wins when several parsers support the same path.
    fn priority(&self) -> u32 {
        PRIORITY_DEFAULT
    }

    fn supports(&self, path: &str, accessor: &dyn ResourceAccessor) -> bool;

    /// Parse `path` into a node named `databaseChangeLog`.
    fn parse_node(&self, path: &str, accessor: &dyn ResourceAccessor) -> Result<ParsedNode>;
}

/// Lower-cased extension of the file name in `path`, without the dot.
pub fn extension_of(path: &str) -> Option<String> {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Read a whole resource as UTF-8. A missing resource is a setup error.
pub fn read_resource(path: &str, accessor: &dyn ResourceAccessor) -> Result<String> {
    let bytes = accessor.open(None, path)?.ok_or_else(|| Error::Setup {
        message: format!("{} does not exist", path),
    })?;
    String::from_utf8(bytes).map_err(|e| Error::Malformed {
        path: path.to_string(),
        message: format!("not valid UTF-8: {}", e),
    })
}

/// Registered parsers, searched by priority.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn ChangelogParser>>,
}

impl ParserRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// A registry holding the YAML, JSON and formatted SQL parsers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(YamlParser));
        registry.register(Box::new(JsonParser));
        registry.register(Box::new(FormattedSqlParser));
        registry
    }

    pub fn register(&mut self, parser: Box<dyn ChangelogParser>) {
        self.parsers.push(parser);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|parser| parser.name()).collect()
    }

    /// The highest-priority parser supporting `path`. Ties go to the parser
    /// registered first.
    pub fn parser_for(
        &self,
        path: &str,
        accessor: &dyn ResourceAccessor,
    ) -> Result<&dyn ChangelogParser> {
        let mut best: Option<&dyn ChangelogParser> = None;
        for parser in &self.parsers {
            if !parser.supports(path, accessor) {
                continue;
            }
            match best {
                Some(current) if current.priority() >= parser.priority() => {}
                _ => best = Some(parser.as_ref()),
            }
        }
        best.ok_or_else(|| Error::UnknownFormat {
            path: path.to_string(),
        })
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
