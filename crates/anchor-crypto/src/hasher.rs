use std::fs::File;
use std::io::{self, Read};

use anchor_types::{Digest, FileReference};
use sha2::{Digest as _, Sha256};

/// Streaming SHA-256 hasher.
///
/// Reads its input in chunks of `chunk_size` bytes and feeds each chunk into
/// a running hash state. The resulting digest depends only on the bytes read,
/// never on the chunk size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamingHasher {
    chunk_size: usize,
}

impl StreamingHasher {
    /// Default read size.
    pub const CHUNK_SIZE: usize = 4096;

    pub const fn new() -> Self {
        Self {
            chunk_size: Self::CHUNK_SIZE,
        }
    }

    /// Hasher with a custom read size. A zero size falls back to one byte.
    pub const fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: if chunk_size == 0 { 1 } else { chunk_size },
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Hash everything `reader` yields until end of input.
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> HashResult<Digest> {
        let mut state = Sha256::new();
        let mut buf = vec![0u8; self.chunk_size];
        let mut total: u64 = 0;
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::Io(e)),
            };
            state.update(&buf[..n]);
            total += n as u64;
        }
        tracing::trace!(bytes = total, chunk_size = self.chunk_size, "stream hashed");
        Ok(Digest::from_hash(state.finalize().into()))
    }

    /// Open and hash a validated file.
    pub fn digest_file(&self, file: &FileReference) -> HashResult<Digest> {
        let handle = File::open(file.path()).map_err(HashError::Io)?;
        let digest = self.digest_reader(handle)?;
        tracing::debug!(file = %file, digest = %digest, "file digest computed");
        Ok(digest)
    }

    /// One-shot hash of an in-memory buffer.
    pub fn digest_bytes(data: &[u8]) -> Digest {
        Digest::from_hash(Sha256::digest(data).into())
    }
}

impl Default for StreamingHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
}

pub type HashResult<T> = Result<T, HashError>;
