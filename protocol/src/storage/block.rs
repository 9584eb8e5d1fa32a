//! # Block Structure
//!
//! A block is a signed, ten-field body stored as a short chain of atoms.
//!
//! ## Atom Layout
//!
//! ```text
//! block_id ─► [tag: "block"] ─► [signature] ─► [body list] ─► ZERO32
//!                                                  │ data
//!                                                  ▼
//!              [f0] ─► [f1] ─► ... ─► [f9] ─► ZERO32      (list chain)
//!               │data   │data          │data
//!               ▼       ▼              ▼
//!         previous   number   ...   validator_public_key  (field atoms)
//! ```
//!
//! `body_hash` is the id of the body-list atom. That is what the validator
//! signs, so the signature commits to all ten fields and nothing else.
//!
//! ## Body Field Order
//!
//! | # | Field                     | Encoding                    |
//! |---|---------------------------|-----------------------------|
//! | 0 | `previous_block_hash`     | 32 bytes, `ZERO32` = genesis|
//! | 1 | `number`                  | minimal big-endian          |
//! | 2 | `timestamp`               | minimal big-endian          |
//! | 3 | `accounts_hash`           | 32 bytes                    |
//! | 4 | `transactions_total_fees` | minimal big-endian          |
//! | 5 | `transactions_hash`       | 32 bytes                    |
//! | 6 | `receipts_hash`           | 32 bytes                    |
//! | 7 | `delay_difficulty`        | minimal big-endian          |
//! | 8 | `delay_output`            | raw bytes                   |
//! | 9 | `validator_public_key`    | 32 bytes                    |
//!
//! Absent fields encode as empty bytes. The order is consensus-critical.

use std::sync::{Arc, Weak};
use thiserror::Error;

use super::atom::Atom;
use super::store::{AtomStore, StoreError};
use super::value::{decode_int, decode_list_chain, encode_list_chain, encode_opt_int, hash_from_slice, ValueError};
use crate::config::{
    Hash, BLOCK_CHAIN_LENGTH, BLOCK_TAG, BODY_FIELD_COUNT, PUBLIC_KEY_LENGTH, ZERO32,
};
use crate::crypto::keys::ValidatorKeypair;

// ---------------------------------------------------------------------------
// Outcome classes
// ---------------------------------------------------------------------------

/// The three ways a block-level operation can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// An encoding contract was broken.
    Malformed,
    /// Something needed to decide is absent or unreachable.
    Unverifiable,
    /// Everything is present and well-formed, and a consensus rule says no.
    Invalid,
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Malformed => "malformed",
            Self::Unverifiable => "unverifiable",
            Self::Invalid => "invalid",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("block chain has {0} atoms, expected 3")]
    ChainLength(usize),

    #[error("not a block: tag atom holds {0:?}")]
    NotABlock(String),

    #[error("body list atom does not hold a 32-byte chain head")]
    BodyHead,

    #[error("block body has {0} fields, expected 10")]
    FieldCount(usize),

    #[error("body field `{field}` is malformed ({len} bytes)")]
    BadField { field: &'static str, len: usize },

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BlockError {
    pub fn class(&self) -> FailureClass {
        match self {
            Self::Value(e) if !e.is_malformed() => FailureClass::Unverifiable,
            Self::Store(e) if !e.is_malformed() => FailureClass::Unverifiable,
            _ => FailureClass::Malformed,
        }
    }
}

const FIELD_NAMES: [&str; BODY_FIELD_COUNT] = [
    "previous_block_hash",
    "number",
    "timestamp",
    "accounts_hash",
    "transactions_total_fees",
    "transactions_hash",
    "receipts_hash",
    "delay_difficulty",
    "delay_output",
    "validator_public_key",
];

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// A block and the bookkeeping that travels with it in memory.
///
/// `transaction_limit` and `transactions_count` are producer-side metrics.
/// They are not part of the body, and a decoded block reports zero for both.
#[derive(Clone, Debug, Default)]
pub struct Block {
    /// Id of the tag atom. Set by [`seal`](Self::seal), [`sign`](Self::sign)
    /// and [`decode`](Self::decode).
    pub hash: Hash,
    pub previous_block_hash: Hash,
    /// Weak link to an in-memory predecessor. Never owned.
    pub previous_block: Option<Weak<Block>>,

    pub number: Option<u64>,
    pub timestamp: Option<u64>,
    pub accounts_hash: Option<Hash>,
    pub transactions_total_fees: Option<u64>,
    pub transactions_hash: Option<Hash>,
    pub receipts_hash: Option<Hash>,
    pub delay_difficulty: Option<u64>,
    pub delay_output: Vec<u8>,
    pub validator_public_key: Option<[u8; PUBLIC_KEY_LENGTH]>,

    pub body_hash: Option<Hash>,
    pub signature: Option<Vec<u8>>,

    pub transaction_limit: u64,
    pub transactions_count: u64,
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
            && self.previous_block_hash == other.previous_block_hash
            && self.number == other.number
            && self.timestamp == other.timestamp
            && self.accounts_hash == other.accounts_hash
            && self.transactions_total_fees == other.transactions_total_fees
            && self.transactions_hash == other.transactions_hash
            && self.receipts_hash == other.receipts_hash
            && self.delay_difficulty == other.delay_difficulty
            && self.delay_output == other.delay_output
            && self.validator_public_key == other.validator_public_key
            && self.body_hash == other.body_hash
            && self.signature == other.signature
    }
}

impl Eq for Block {}

/// Output of [`Block::encode`]: the block id, its body hash and every atom
/// needed to store it.
#[derive(Debug, Clone)]
pub struct EncodedBlock {
    pub id: Hash,
    pub body_hash: Hash,
    pub atoms: Vec<Atom>,
}

impl Block {
    pub fn is_genesis(&self) -> bool {
        self.previous_block_hash == ZERO32
    }

    fn body_fields(&self) -> [Vec<u8>; BODY_FIELD_COUNT] {
        let opt_hash = |h: &Option<Hash>| h.map(|h| h.to_vec()).unwrap_or_default();
        [
            self.previous_block_hash.to_vec(),
            encode_opt_int(self.number),
            encode_opt_int(self.timestamp),
            opt_hash(&self.accounts_hash),
            encode_opt_int(self.transactions_total_fees),
            opt_hash(&self.transactions_hash),
            opt_hash(&self.receipts_hash),
            encode_opt_int(self.delay_difficulty),
            self.delay_output.clone(),
            self.validator_public_key
                .map(|pk| pk.to_vec())
                .unwrap_or_default(),
        ]
    }

    /// Body hash and the field, chain and body-list atoms.
    pub fn body_atoms(&self) -> (Hash, Vec<Atom>) {
        let fields: Vec<Atom> = self.body_fields().into_iter().map(Atom::leaf).collect();
        let ids: Vec<Hash> = fields.iter().map(Atom::object_id).collect();
        let (head, chain) = encode_list_chain(&ids);
        let body_list = Atom::leaf(head.to_vec());
        let body_hash = body_list.object_id();

        let mut atoms = fields;
        atoms.extend(chain);
        atoms.push(body_list);
        (body_hash, atoms)
    }

    pub fn compute_body_hash(&self) -> Hash {
        self.body_atoms().0
    }

    /// Build every atom of the block. Pure: touches no store and does not
    /// update `self`.
    pub fn encode(&self) -> EncodedBlock {
        let (body_hash, mut atoms) = self.body_atoms();
        let signature = Atom::new(self.signature.clone().unwrap_or_default(), body_hash);
        let tag = Atom::new(BLOCK_TAG.to_vec(), signature.object_id());
        let id = tag.object_id();
        atoms.push(signature);
        atoms.push(tag);
        EncodedBlock {
            id,
            body_hash,
            atoms,
        }
    }

    /// Recompute `body_hash` and `hash` from the current fields.
    pub fn seal(&mut self) -> Hash {
        let encoded = self.encode();
        self.body_hash = Some(encoded.body_hash);
        self.hash = encoded.id;
        self.hash
    }

    /// Sign the body hash with `keypair`, which becomes the block's
    /// validator. Returns the new block id.
    pub fn sign(&mut self, keypair: &ValidatorKeypair) -> Hash {
        self.validator_public_key = Some(keypair.public_key_bytes());
        let body_hash = self.compute_body_hash();
        self.signature = Some(keypair.sign(&body_hash).to_vec());
        self.seal()
    }

    /// Write every atom of the block. Returns the block id.
    pub fn store(&self, store: &AtomStore) -> Result<Hash, BlockError> {
        let encoded = self.encode();
        store.put_atoms(&encoded.atoms)?;
        Ok(encoded.id)
    }

    pub fn attach_previous(&mut self, previous: &Arc<Block>) {
        self.previous_block = Some(Arc::downgrade(previous));
    }

    /// The attached predecessor, if it is still alive and matches
    /// `previous_block_hash`.
    pub fn attached_previous(&self) -> Option<Arc<Block>> {
        self.previous_block
            .as_ref()
            .and_then(Weak::upgrade)
            .filter(|prev| prev.hash == self.previous_block_hash)
    }

    /// Decode a block from the store.
    ///
    /// `Ok(None)` if any atom is missing. Structural violations are errors
    /// of class [`FailureClass::Malformed`].
    pub fn decode(store: &AtomStore, id: &Hash) -> Result<Option<Self>, BlockError> {
        let Some(chain) = store.get_chain(id)? else {
            return Ok(None);
        };
        let [tag, signature, body_list]: [Atom; BLOCK_CHAIN_LENGTH] = chain
            .try_into()
            .map_err(|chain: Vec<Atom>| BlockError::ChainLength(chain.len()))?;

        if tag.data != BLOCK_TAG {
            return Err(BlockError::NotABlock(
                String::from_utf8_lossy(&tag.data).into_owned(),
            ));
        }
        let head = hash_from_slice(&body_list.data).ok_or(BlockError::BodyHead)?;

        let Some(field_ids) = decode_list_chain(store, &head)? else {
            return Ok(None);
        };
        if field_ids.len() != BODY_FIELD_COUNT {
            return Err(BlockError::FieldCount(field_ids.len()));
        }
        let mut fields = Vec::with_capacity(BODY_FIELD_COUNT);
        for field_id in &field_ids {
            let Some(atom) = store.get(field_id)? else {
                return Ok(None);
            };
            fields.push(atom.data);
        }

        let int = |i: usize| decode_int(&fields[i]).map_err(BlockError::from);
        let hash = |i: usize| -> Result<Option<Hash>, BlockError> {
            match fields[i].len() {
                0 => Ok(None),
                _ => hash_from_slice(&fields[i]).map(Some).ok_or(BlockError::BadField {
                    field: FIELD_NAMES[i],
                    len: fields[i].len(),
                }),
            }
        };

        let validator_public_key = match fields[9].len() {
            0 => None,
            _ => Some(hash_from_slice(&fields[9]).ok_or(BlockError::BadField {
                field: FIELD_NAMES[9],
                len: fields[9].len(),
            })?),
        };

        Ok(Some(Self {
            hash: *id,
            previous_block_hash: hash(0)?.unwrap_or(ZERO32),
            previous_block: None,
            number: int(1)?,
            timestamp: int(2)?,
            accounts_hash: hash(3)?,
            transactions_total_fees: int(4)?,
            transactions_hash: hash(5)?,
            receipts_hash: hash(6)?,
            delay_difficulty: int(7)?,
            delay_output: fields[8].clone(),
            validator_public_key,
            body_hash: Some(body_list.object_id()),
            signature: (!signature.data.is_empty()).then_some(signature.data),
            transaction_limit: 0,
            transactions_count: 0,
        }))
    }
}
