//! Error types for tree and graph queries.

use fdoc_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("No file path given")]
    EmptyPath,

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, GraphError>;
