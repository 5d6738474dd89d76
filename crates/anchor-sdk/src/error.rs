use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("{0}")]
    Type(#[from] anchor_types::TypeError),

    #[error("hash error: {0}")]
    Hash(#[from] anchor_crypto::HashError),

    #[error("ledger error: {0}")]
    Ledger(#[from] anchor_ledger::LedgerError),

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type SdkResult<T> = Result<T, SdkError>;
