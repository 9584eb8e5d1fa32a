//! # Atom
//!
//! The smallest content-addressed object: a payload, a pointer to the next
//! atom and the payload length.
//!
//! ```text
//! object_id = BLAKE3( BLAKE3(data) || next || size as u64 LE )
//! ```
//!
//! Hashing the payload first means a receiver can check an advertised id
//! from `(data_hash, next, size)` alone, before the payload arrives. See
//! [`Atom::verify_metadata`].
//!
//! ## Wire layout
//!
//! ```text
//! +-----------------+----------------------+
//! | next (32 bytes) | data (rest of buffer)|
//! +-----------------+----------------------+
//! ```
//!
//! Size is implicit: it is whatever is left after the pointer.

use thiserror::Error;

use crate::config::{Hash, HASH_LENGTH, ZERO32};
use crate::crypto::hash::{blake3_hash, blake3_hash_multi};

/// Errors that can occur while decoding an atom from its wire form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AtomError {
    #[error("atom buffer too short: {0} bytes, need at least 32 for the next pointer")]
    TooShort(usize),
}

/// A minimal hash-linked node.
///
/// Atoms are immutable. Two atoms with the same `(data, next)` are the same
/// object and have the same id, wherever and whenever they were built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Atom {
    pub data: Vec<u8>,
    /// Id of the successor atom, or [`ZERO32`] for none.
    pub next: Hash,
    /// Always `data.len()`. Kept as a field because it is part of the id.
    pub size: u64,
}

impl Atom {
    pub fn new(data: impl Into<Vec<u8>>, next: Hash) -> Self {
        let data = data.into();
        let size = data.len() as u64;
        Self { data, next, size }
    }

    /// An atom with no successor.
    pub fn leaf(data: impl Into<Vec<u8>>) -> Self {
        Self::new(data, ZERO32)
    }

    pub fn data_hash(&self) -> Hash {
        blake3_hash(&self.data)
    }

    /// The content id of this atom.
    pub fn object_id(&self) -> Hash {
        Self::id_from_parts(&self.data_hash(), &self.next, self.size)
    }

    /// Compute an atom id from header metadata.
    pub fn id_from_parts(data_hash: &Hash, next: &Hash, size: u64) -> Hash {
        blake3_hash_multi(&[data_hash, next, &size.to_le_bytes()])
    }

    /// Check an advertised id against advertised metadata.
    pub fn verify_metadata(object_id: &Hash, size: u64, next: &Hash, data_hash: &Hash) -> bool {
        Self::id_from_parts(data_hash, next, size) == *object_id
    }

    pub fn has_next(&self) -> bool {
        self.next != ZERO32
    }

    /// Serialize to `next || data`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HASH_LENGTH + self.data.len());
        out.extend_from_slice(&self.next);
        out.extend_from_slice(&self.data);
        out
    }

    /// Parse `next || data`.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, AtomError> {
        if buf.len() < HASH_LENGTH {
            return Err(AtomError::TooShort(buf.len()));
        }
        let (next_bytes, data) = buf.split_at(HASH_LENGTH);
        let mut next = [0u8; HASH_LENGTH];
        next.copy_from_slice(next_bytes);
        Ok(Self::new(data.to_vec(), next))
    }
}
