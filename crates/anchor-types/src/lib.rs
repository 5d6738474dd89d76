//! Foundation types for ledger anchoring.
//!
//! Every value here lives for a single anchoring run. Only the network
//! certificate and the receipt outlive it, as files on disk.
//!
//! # Key Types
//!
//! - [`FileReference`]: Path validated to name an existing regular file
//! - [`Digest`]: SHA-256 content digest, rendered as 64 lowercase hex characters
//! - [`EntryPayload`]: The `{file_name, digest}` record written to the ledger
//! - [`TransactionId`]: Opaque identifier of a pending ledger write
//! - [`Receipt`]: Opaque consensus receipt document
//! - [`NetworkIdentity`]: The ledger's TLS identity material

pub mod digest;
pub mod entry;
pub mod error;
pub mod file;
pub mod identity;
pub mod json;
pub mod receipt;

pub use digest::Digest;
pub use entry::{EntryPayload, TransactionId};
pub use error::TypeError;
pub use file::FileReference;
pub use identity::NetworkIdentity;
pub use receipt::Receipt;
