//! High-level SDK for anchoring files in a confidential ledger.
//!
//! [`Anchor`] runs the whole pipeline for one file: resolve a credential,
//! fetch and persist the ledger's network certificate, hash the file, submit
//! `{file_name, digest}`, wait for commit, wait for the receipt, and persist
//! it. Collaborators are passed in explicitly, so tests swap the remote
//! services for [`InMemoryLedger`].

pub mod anchor;
pub mod config;
pub mod error;
pub mod hooks;
pub mod persist;

pub use anchor::{Anchor, AnchorOutcome};
pub use config::AnchorConfig;
pub use error::{SdkError, SdkResult};
pub use hooks::{AnchorHook, NoOpHook};

// Re-export key types
pub use anchor_types::{Digest, EntryPayload, FileReference, NetworkIdentity, Receipt, TransactionId};
pub use anchor_ledger::{
    CredentialChain, HttpIdentityClient, HttpLedgerConnector, InMemoryLedger, PollOptions,
    StaticCredential,
};
