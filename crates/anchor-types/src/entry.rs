use std::fmt;

use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::error::TypeError;
use crate::file::FileReference;
use crate::json;

/// The record anchored in the ledger for one file.
///
/// Field order is part of the canonical form: `file_name` first, then
/// `digest`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPayload {
    /// Base name of the file, never a path.
    pub file_name: String,
    /// SHA-256 of the file's bytes.
    pub digest: Digest,
}

impl EntryPayload {
    /// Build the payload for a file whose digest has been computed.
    pub fn for_file(file: &FileReference, digest: Digest) -> Self {
        Self {
            file_name: file.file_name().to_string(),
            digest,
        }
    }

    /// Canonical string form submitted as the ledger entry contents.
    ///
    /// Entries written by other clients of the same ledger use this exact
    /// text, so a verifier can rebuild it from `(file_name, digest)`.
    pub fn to_contents(&self) -> Result<String, TypeError> {
        json::to_spaced_string(self)
    }
}

/// Opaque identifier the ledger assigns to a pending write.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TypeError::EmptyTransactionId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
