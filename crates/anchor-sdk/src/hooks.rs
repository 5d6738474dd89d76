use anchor_types::{Digest, FileReference, Receipt, TransactionId};

/// Observer for progress through an anchoring run.
///
/// All methods default to doing nothing.
pub trait AnchorHook: Send + Sync {
    /// Called once the digest is known, before anything is submitted.
    fn on_digest(&self, _file: &FileReference, _digest: &Digest) {}

    fn on_committed(&self, _transaction: &TransactionId) {}

    fn on_receipt(&self, _transaction: &TransactionId, _receipt: &Receipt) {}
}

pub struct NoOpHook;

impl AnchorHook for NoOpHook {}
