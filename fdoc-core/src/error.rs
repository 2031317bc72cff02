//! Error types for the core crate.
//!
//! We keep errors simple and actionable. Each variant tells you
//! exactly what went wrong and (usually) how to fix it.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience type for functions that can fail in the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Things that can go wrong while reading, caching or analysing sources.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Couldn't read or write something on disk.
    #[error("i/o failure on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File extension doesn't map to any supported source kind.
    #[error("unsupported source file '{0}'")]
    UnsupportedSource(PathBuf),

    /// Tree-sitter failed to parse the script, or the script has
    /// syntax errors.
    #[error("parser error: {0}")]
    Parser(String),

    /// A cache namespace name that is not `files`, `folders` or `indexes`.
    #[error("unknown cache namespace '{0}' (expected files, folders or indexes)")]
    UnknownNamespace(String),

    /// The project configuration file exists but is not valid JSON.
    #[error("invalid configuration in '{path}': {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No usable project root. Needs the user to point at a workspace.
    #[error("project root '{0}' does not exist or is not a directory")]
    ConfigurationMissing(PathBuf),

    /// The docs mapping has no entry with this name.
    #[error("documentation '{0}' is not configured")]
    DocNotFound(String),

    /// The change watcher could not be installed.
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

impl CoreError {
    /// Creates an IO error with the path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
