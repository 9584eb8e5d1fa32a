// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Atomchain Protocol — Consensus Core
//!
//! The part of an Atomchain node that has to be bit-for-bit identical on
//! every machine: the content-addressed object store, the binary state trie
//! built on top of it, and the block rules that turn transactions into a
//! new, signed chain state.
//!
//! Networking, the script evaluator and process wiring are collaborators
//! that talk to this crate through narrow seams (raw object bytes by hash,
//! opaque byte arguments). Nothing in here knows about sockets.
//!
//! ## Architecture
//!
//! Leaf-first:
//!
//! - **storage::atom** — the `{data, next, size}` atom and its id.
//! - **storage::store** — tiered `AtomStore` with an explicit hot cache.
//! - **storage::value** — type-tagged values and the list encoding.
//! - **storage::patricia** — persistent binary radix trie.
//! - **storage::merkle** — fixed-capacity balanced hash tree.
//! - **storage::account** — ledger entries and the accounts trie.
//! - **storage::block** — the ten-field block body and its atom chain.
//! - **consensus** — validation, production and genesis.
//! - **transaction** — transfers and receipts.
//! - **crypto** — BLAKE3 hashing and Ed25519 keys.
//! - **config** — protocol constants and chain parameters.
//!
//! ## Design Philosophy
//!
//! 1. Nothing is mutated after it is hashed. Every update returns a new root.
//! 2. Malformed, unverifiable and invalid are three different answers.
//! 3. A failed block production leaves no trace in the store.

pub mod config;
pub mod consensus;
pub mod crypto;
pub mod storage;
pub mod transaction;

pub use config::{ChainConfig, Hash, ZERO32};
