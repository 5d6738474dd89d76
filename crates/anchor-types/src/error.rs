use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by type construction and rendering.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("File not found: {}", .0.display())]
    NotARegularFile(PathBuf),

    #[error("path has no file name component: {}", .0.display())]
    MissingFileName(PathBuf),

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("empty transaction identifier")]
    EmptyTransactionId,

    #[error("serialization error: {0}")]
    Serialization(String),
}
