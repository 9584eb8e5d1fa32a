//! # Cryptographic Primitives
//!
//! Two primitives, both boring on purpose:
//!
//! - **BLAKE3** for every content address: atom ids, trie node ids and
//!   Merkle nodes.
//! - **Ed25519** for validator block signatures and transaction signatures.
//!
//! Everything here is a thin wrapper around audited crates. If you're
//! tempted to optimize these functions, please reconsider.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{blake3_hash, blake3_hash_multi};
pub use keys::{KeyError, ValidatorKeypair};
pub use signatures::{verify_raw, SignatureError};
