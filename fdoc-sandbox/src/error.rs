//! Error types for the sandbox.
//!
//! These abort an invocation. Problems with the snippet itself (syntax,
//! timeouts, thrown errors) are not errors: they are reported through
//! [`SandboxOutcome`](crate::SandboxOutcome).

use fdoc_core::CoreError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SandboxError>;

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("mock '{name}' not found at '{path}'")]
    MockNotFound { name: String, path: PathBuf },

    #[error("mock '{name}' has unsupported file extension '{extension}' (expected .json or .js)")]
    UnsupportedMock { name: String, extension: String },

    #[error("failed to load mock '{name}': {reason}")]
    MockLoad { name: String, reason: String },

    #[error("JavaScript runtime '{runtime}' is not available: {source}")]
    RuntimeUnavailable {
        runtime: String,
        #[source]
        source: io::Error,
    },

    #[error("sandbox i/o failure: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] CoreError),
}
