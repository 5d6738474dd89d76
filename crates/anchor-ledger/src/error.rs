use std::time::Duration;

use thiserror::Error;

/// Errors produced at the ledger service boundary.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Protocol(String),

    #[error("timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },

    #[error("type error: {0}")]
    Type(#[from] anchor_types::TypeError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
