//! Content digests for ledger anchoring.
//!
//! Files are hashed with SHA-256 in fixed-size chunks, so memory use stays
//! flat regardless of file size. All crypto wraps the `sha2` crate; there is
//! no custom cryptography.

pub mod hasher;

pub use hasher::{HashError, HashResult, StreamingHasher};
