//! # Storage Module
//!
//! Content-addressed storage and the persistent data structures built on
//! it.
//!
//! ## Architecture
//!
//! ```text
//! atom.rs      — {data, next, size} atom, its id and wire form
//! store.rs     — AtomStore: hot cache + primary + fallback tiers, WorkingSet
//! db.rs        — SledStore: persistent object tier with a byte budget
//! value.rs     — type-tagged values, list chains, records, integer codec
//! patricia.rs  — persistent binary radix trie
//! merkle.rs    — fixed-capacity balanced hash tree
//! account.rs   — Account record and the accounts trie
//! block.rs     — ten-field block body and its atom chain
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! Account ─► Accounts (PatriciaTrie) ─► accounts_hash ─┐
//! Transaction ids ─► MerkleTree ─► transactions_hash ──┼─► Block body ─► body_hash
//! Receipt ids ─► MerkleTree ─► receipts_hash ──────────┘
//!                                   everything ─► AtomStore ─► SledStore
//! ```
//!
//! ## Design Decisions
//!
//! 1. **Nothing is updated in place.** Every write creates new objects and
//!    returns a new root. Old roots stay readable.
//!
//! 2. **A miss is not an error.** Lookups return `Ok(None)` when an object
//!    is absent and reserve `Err` for bad bytes or a failing tier.

pub mod account;
pub mod atom;
pub mod block;
pub mod db;
pub mod merkle;
pub mod patricia;
pub mod store;
pub mod value;

pub use account::{Account, AccountError, Accounts};
pub use atom::{Atom, AtomError};
pub use block::{Block, BlockError, EncodedBlock, FailureClass};
pub use db::SledStore;
pub use merkle::{MerkleProof, MerkleTree};
pub use patricia::{PatriciaNode, PatriciaTrie, TrieError};
pub use store::{AtomStore, MemoryStore, ObjectStore, StatsSnapshot, StoreError, WorkingSet};
pub use value::{AtomKind, AtomValue, ValueError};
