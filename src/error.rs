//! # Error Handling
//!
//! This module defines the centralized error type for changelog resolution.
//! It uses `thiserror` to build a single `Error` enum covering every failure
//! the resolver can hit while discovering, parsing and assembling nested
//! changelog documents.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Variants carry the offending path or node
//!   name so a failure deep inside an include chain can still be diagnosed.
//!
//! - **`ErrorKind`**: A coarse classification of every variant, used by
//!   callers that need to tell setup problems from structural defects or
//!   unrecognized formats.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Only `UnknownFormat` is ever recovered from inside the resolver (subject
//! to the include's unknown-format policy). Everything else aborts the
//! resolution and is returned to the caller.

use thiserror::Error;

/// Coarse classification of resolution failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing required attribute, missing or empty includeAll directory,
    /// unreadable properties file, failed include.
    Setup,
    /// No parser recognizes the file.
    UnknownFormat,
    /// Unexpected node with children, unrecognized ordering hint.
    Structural,
    /// Reading a resource failed.
    Io,
    /// The document or one of its attributes could not be parsed.
    Malformed,
}

/// Main error type for changelog resolution
#[derive(Error, Debug)]
pub enum Error {
    /// A required attribute or resource was missing, or an include failed.
    #[error("Setup error: {message}")]
    Setup { message: String },

    /// A nested include failed. The source error describes the inner failure.
    #[error("Error including '{path}': {source}")]
    Include {
        path: String,
        #[source]
        source: Box<Error>,
    },

    /// No registered parser recognizes the file.
    #[error("Unknown changelog format: {path}")]
    UnknownFormat { path: String },

    /// A node with children that the document does not understand.
    #[error("Unexpected node found under databaseChangeLog in {path}: {node}")]
    UnexpectedNode { node: String, path: String },

    /// A changeset carried an ordering hint other than first, last or none.
    #[error("Unknown runOrder: {value}")]
    UnknownRunOrder { value: String },

    /// The document could not be parsed.
    #[error("Malformed changelog {path}: {message}")]
    Malformed { path: String, message: String },

    /// A node attribute had the wrong shape or value.
    #[error("Invalid value for '{attribute}' on '{node}': {message}")]
    InvalidAttribute {
        node: String,
        attribute: String,
        message: String,
    },

    /// The resolution settings file could not be read.
    #[error("Settings error: {message}")]
    Settings { message: String },

    /// A properties file could not be parsed.
    #[error("Properties file error in {file}: {message}")]
    Properties { file: String, message: String },

    /// Listing resources under an includeAll directory failed while the
    /// directive required the directory to exist.
    #[error("Could not list resources under '{path}': {source}")]
    ResourceListing {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Setup { .. }
            | Error::Include { .. }
            | Error::Settings { .. }
            | Error::Properties { .. }
            | Error::ResourceListing { .. } => ErrorKind::Setup,
            Error::UnknownFormat { .. } => ErrorKind::UnknownFormat,
            Error::UnexpectedNode { .. } | Error::UnknownRunOrder { .. } => ErrorKind::Structural,
            Error::Io(_) => ErrorKind::Io,
            Error::Malformed { .. } | Error::InvalidAttribute { .. } | Error::Glob(_) => {
                ErrorKind::Malformed
            }
        }
    }

    /// Follow `Include` wrappers down to the error that started the failure.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Include { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
