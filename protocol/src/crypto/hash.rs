//! # Hashing Utilities
//!
//! BLAKE3 is the only hash function in the consensus core. Atom ids, trie
//! node ids and Merkle nodes are all BLAKE3 digests, so the hash choice is
//! part of the wire format. Swapping it changes every object id on the chain.

use crate::config::Hash;

/// Compute the BLAKE3 hash of the input data.
///
/// # Example
///
/// ```
/// use atomchain_protocol::crypto::blake3_hash;
///
/// let hash = blake3_hash(b"atomchain");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn blake3_hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Hash several byte slices as if they were concatenated, without actually
/// concatenating them.
///
/// `blake3_hash_multi(&[a, b])` equals `blake3_hash(&[a, b].concat())`.
/// Atom ids and Merkle interior nodes are built this way.
pub fn blake3_hash_multi(parts: &[&[u8]]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

/// Lowercase hex of the first 8 bytes. For log fields, not for identity.
pub fn short_hex(hash: &[u8]) -> String {
    let end = hash.len().min(8);
    hex::encode(&hash[..end])
}
