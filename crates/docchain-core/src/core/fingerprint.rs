// crates/docchain-core/src/core/fingerprint.rs
// ============================================================================
// Module: DocChain Fingerprinter
// Description: Streaming content fingerprints for uploaded documents.
// Purpose: Hash arbitrarily large byte streams with bounded memory.
// Dependencies: sha2, thiserror
// ============================================================================

//! ## Overview
//! The fingerprinter reads a byte stream in fixed-size chunks and feeds each
//! chunk into the digest, so memory use is bounded by the chunk size rather
//! than the input size. Chunking never changes the result: the digest is a
//! pure function of the concatenated bytes. Empty input is valid and yields
//! the digest of the empty sequence.
//!
//! Read failures are reported as [`InputError::Read`] and carry the original
//! [`std::io::Error`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Read;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashDigest;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default read chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Fingerprint of a byte stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Content digest.
    pub digest: HashDigest,
    /// Number of bytes consumed from the stream.
    pub byte_len: u64,
}

impl Fingerprint {
    /// Returns the lowercase hex digest.
    #[must_use]
    pub fn hex(&self) -> &str {
        &self.digest.value
    }

    /// Returns true when the stream contained no bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.byte_len == 0
    }
}

/// Errors raised while consuming an input stream.
#[derive(Debug, Error)]
pub enum InputError {
    /// The underlying reader failed.
    #[error("input read error: {0}")]
    Read(#[from] io::Error),
    /// The stream exceeded the configured byte limit.
    #[error("input exceeds size limit of {limit} bytes")]
    TooLarge {
        /// Maximum accepted bytes.
        limit: u64,
    },
}

// ============================================================================
// SECTION: Fingerprinter
// ============================================================================

/// Streaming content fingerprinter.
///
/// # Invariants
/// - `chunk_size` is always greater than zero.
/// - Output depends only on the bytes read, never on how reads are split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprinter {
    /// Digest algorithm.
    algorithm: HashAlgorithm,
    /// Read buffer size.
    chunk_size: usize,
    /// Optional maximum number of bytes accepted.
    max_bytes: Option<u64>,
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_ALGORITHM)
    }
}

impl Fingerprinter {
    /// Creates an unbounded fingerprinter using the default chunk size.
    #[must_use]
    pub const fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_bytes: None,
        }
    }

    /// Returns a copy that rejects streams longer than `max_bytes`.
    #[must_use]
    pub const fn with_limit(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Returns a copy that reads in chunks of `chunk_size` bytes.
    ///
    /// A zero chunk size falls back to [`DEFAULT_CHUNK_SIZE`].
    #[must_use]
    pub const fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = if chunk_size == 0 { DEFAULT_CHUNK_SIZE } else { chunk_size };
        self
    }

    /// Returns the configured digest algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Fingerprints an in-memory byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::TooLarge`] when the slice exceeds the limit.
    pub fn fingerprint_bytes(&self, bytes: &[u8]) -> Result<Fingerprint, InputError> {
        self.fingerprint_reader(bytes)
    }

    /// Fingerprints a byte stream incrementally.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Read`] when the reader fails and
    /// [`InputError::TooLarge`] when the stream exceeds the limit.
    pub fn fingerprint_reader<R: Read>(&self, mut reader: R) -> Result<Fingerprint, InputError> {
        match self.algorithm {
            HashAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                let mut buffer = vec![0_u8; self.chunk_size];
                let mut byte_len: u64 = 0;
                loop {
                    let read = match reader.read(&mut buffer) {
                        Ok(0) => break,
                        Ok(read) => read,
                        Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                        Err(err) => return Err(InputError::Read(err)),
                    };
                    byte_len = byte_len.saturating_add(u64::try_from(read).unwrap_or(u64::MAX));
                    if let Some(limit) = self.max_bytes
                        && byte_len > limit
                    {
                        return Err(InputError::TooLarge {
                            limit,
                        });
                    }
                    hasher.update(&buffer[..read]);
                }
                Ok(Fingerprint {
                    digest: HashDigest::new(HashAlgorithm::Sha256, &hasher.finalize()),
                    byte_len,
                })
            }
        }
    }
}
