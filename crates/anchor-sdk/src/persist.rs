//! Whole-file writes of the run's durable outputs.
//!
//! Files are overwritten without locking. Two runs sharing an output
//! directory can interleave and leave a certificate and a receipt from
//! different runs side by side.

use std::path::Path;

use anchor_types::{NetworkIdentity, Receipt};

use crate::error::{SdkError, SdkResult};

/// Write the ledger's certificate text exactly as received.
pub fn write_certificate(path: &Path, identity: &NetworkIdentity) -> SdkResult<()> {
    write(path, identity.certificate_pem())
}

/// Write the receipt with sorted keys and 2-space indentation.
pub fn write_receipt(path: &Path, receipt: &Receipt) -> SdkResult<()> {
    let rendered = receipt.to_canonical_json()?;
    write(path, &rendered)
}

fn write(path: &Path, contents: &str) -> SdkResult<()> {
    std::fs::write(path, contents).map_err(|source| SdkError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "output written");
    Ok(())
}
