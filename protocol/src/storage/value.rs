//! # Typed Values, Lists and Records
//!
//! The atom store does not interpret payloads. Everything above it agrees on
//! a small set of conventions, and this module is the only place that knows
//! them.
//!
//! ## List chains
//!
//! An ordered list of ids is folded right-to-left into a chain of atoms,
//! each holding one id and pointing at the rest of the list:
//!
//! ```text
//! [a, b, c]  →  {data: a} → {data: b} → {data: c} → ZERO32
//!                 ^ head
//! ```
//!
//! ## Type-tagged values
//!
//! A value is a two-atom chain: a tag atom naming the kind, pointing at the
//! value atom.
//!
//! | Kind     | Tag        | Value atom                                  |
//! |----------|------------|---------------------------------------------|
//! | Symbol   | `"symbol"` | `u32 LE length ‖ UTF-8`                      |
//! | Bytes    | `"bytes"`  | raw bytes                                   |
//! | List     | `"list"`   | `u64 LE count`, `next` → element chain head |
//!
//! The tag is resolved once into [`AtomKind`] at the decode boundary.
//!
//! ## Records
//!
//! A record is a list value whose elements are bytes values. Accounts,
//! transactions and receipts are records.

use thiserror::Error;

use super::atom::Atom;
use super::store::{AtomStore, StoreError};
use crate::config::{Hash, ZERO32};

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors raised when stored objects do not follow the value conventions.
///
/// Everything except `Store` is a malformed-encoding error.
#[derive(Debug, Error)]
pub enum ValueError {
    #[error("unknown value tag {0:?}")]
    UnknownTag(String),

    #[error("expected a {expected:?} value, found {found:?}")]
    WrongKind { expected: AtomKind, found: AtomKind },

    #[error("symbol payload is malformed")]
    BadSymbol,

    #[error("list header must be 8 bytes, got {0}")]
    BadListHeader(usize),

    #[error("list element {0} is not a 32-byte pointer")]
    BadElementPointer(usize),

    #[error("list declares {declared} elements but its chain has {actual}")]
    CountMismatch { declared: u64, actual: u64 },

    #[error("record has {actual} fields, expected {expected}")]
    FieldCount { expected: usize, actual: usize },

    #[error("integer is {0} bytes wide, at most 8 fit in a u64")]
    IntegerTooWide(usize),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ValueError {
    pub fn is_malformed(&self) -> bool {
        match self {
            Self::Store(e) => e.is_malformed(),
            _ => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Integer codec
// ---------------------------------------------------------------------------

/// Minimal-width big-endian. Zero is a single zero byte.
pub fn encode_int(value: u64) -> Vec<u8> {
    if value == 0 {
        return vec![0];
    }
    let bytes = value.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
    bytes[first..].to_vec()
}

/// Optional integers encode as empty bytes when absent.
pub fn encode_opt_int(value: Option<u64>) -> Vec<u8> {
    value.map(encode_int).unwrap_or_default()
}

/// Inverse of [`encode_opt_int`]. Leading zero bytes are tolerated.
pub fn decode_int(bytes: &[u8]) -> Result<Option<u64>, ValueError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let significant = &bytes[first..];
    if significant.len() > 8 {
        return Err(ValueError::IntegerTooWide(significant.len()));
    }
    Ok(Some(
        significant
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b)),
    ))
}

/// Read a 32-byte hash out of a payload.
pub fn hash_from_slice(bytes: &[u8]) -> Option<Hash> {
    bytes.try_into().ok()
}

// ---------------------------------------------------------------------------
// AtomKind / AtomValue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomKind {
    Symbol,
    Bytes,
    List,
}

impl AtomKind {
    pub fn tag(self) -> &'static [u8] {
        match self {
            Self::Symbol => b"symbol",
            Self::Bytes => b"bytes",
            Self::List => b"list",
        }
    }

    pub fn from_tag(tag: &[u8]) -> Result<Self, ValueError> {
        match tag {
            b"symbol" => Ok(Self::Symbol),
            b"bytes" => Ok(Self::Bytes),
            b"list" => Ok(Self::List),
            other => Err(ValueError::UnknownTag(
                String::from_utf8_lossy(other).into_owned(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtomValue {
    Symbol(String),
    Bytes(Vec<u8>),
    /// Ids of the element values, in order.
    List(Vec<Hash>),
}

impl AtomValue {
    pub fn kind(&self) -> AtomKind {
        match self {
            Self::Symbol(_) => AtomKind::Symbol,
            Self::Bytes(_) => AtomKind::Bytes,
            Self::List(_) => AtomKind::List,
        }
    }

    /// Build the atoms for this value without touching a store.
    ///
    /// Returns the tag atom id (the value's id) and every atom needed,
    /// head first.
    pub fn to_atoms(&self) -> (Hash, Vec<Atom>) {
        let mut atoms = Vec::new();
        let value_atom = match self {
            Self::Symbol(s) => {
                let mut payload = (s.len() as u32).to_le_bytes().to_vec();
                payload.extend_from_slice(s.as_bytes());
                Atom::leaf(payload)
            }
            Self::Bytes(b) => Atom::leaf(b.clone()),
            Self::List(ids) => {
                let (head, chain) = encode_list_chain(ids);
                atoms.extend(chain);
                Atom::new((ids.len() as u64).to_le_bytes().to_vec(), head)
            }
        };
        let tag_atom = Atom::new(self.kind().tag().to_vec(), value_atom.object_id());
        let id = tag_atom.object_id();
        atoms.insert(0, value_atom);
        atoms.insert(0, tag_atom);
        (id, atoms)
    }
}

/// Fold ids right-to-left into a chain. An empty list has head [`ZERO32`].
///
/// Returns the head id and the chain atoms, head first.
pub fn encode_list_chain(ids: &[Hash]) -> (Hash, Vec<Atom>) {
    let mut head = ZERO32;
    let mut atoms = Vec::with_capacity(ids.len());
    for id in ids.iter().rev() {
        let atom = Atom::new(id.to_vec(), head);
        head = atom.object_id();
        atoms.push(atom);
    }
    atoms.reverse();
    (head, atoms)
}

/// Walk a list chain and return the ids it holds.
///
/// `Ok(None)` if a link is missing.
pub fn decode_list_chain(store: &AtomStore, head: &Hash) -> Result<Option<Vec<Hash>>, ValueError> {
    let Some(chain) = store.get_chain(head)? else {
        return Ok(None);
    };
    chain
        .iter()
        .enumerate()
        .map(|(i, atom)| hash_from_slice(&atom.data).ok_or(ValueError::BadElementPointer(i)))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

pub fn put_value(store: &AtomStore, value: &AtomValue) -> Result<Hash, StoreError> {
    let (id, atoms) = value.to_atoms();
    store.put_atoms(&atoms)?;
    Ok(id)
}

/// Load and decode a type-tagged value. `Ok(None)` if any piece is missing.
pub fn get_value(store: &AtomStore, id: &Hash) -> Result<Option<AtomValue>, ValueError> {
    let Some(tag) = store.get(id)? else {
        return Ok(None);
    };
    let kind = AtomKind::from_tag(&tag.data)?;
    let Some(value) = store.get(&tag.next)? else {
        return Ok(None);
    };

    let decoded = match kind {
        AtomKind::Bytes => AtomValue::Bytes(value.data),
        AtomKind::Symbol => {
            if value.data.len() < 4 {
                return Err(ValueError::BadSymbol);
            }
            let (len_bytes, text) = value.data.split_at(4);
            let len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]);
            if len as usize != text.len() {
                return Err(ValueError::BadSymbol);
            }
            let s = std::str::from_utf8(text).map_err(|_| ValueError::BadSymbol)?;
            AtomValue::Symbol(s.to_owned())
        }
        AtomKind::List => {
            let header: [u8; 8] = value
                .data
                .as_slice()
                .try_into()
                .map_err(|_| ValueError::BadListHeader(value.data.len()))?;
            let declared = u64::from_le_bytes(header);
            let Some(ids) = decode_list_chain(store, &value.next)? else {
                return Ok(None);
            };
            if ids.len() as u64 != declared {
                return Err(ValueError::CountMismatch {
                    declared,
                    actual: ids.len() as u64,
                });
            }
            AtomValue::List(ids)
        }
    };
    Ok(Some(decoded))
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Encode a record of byte fields. Returns the record id and its atoms.
pub fn encode_record(fields: &[&[u8]]) -> (Hash, Vec<Atom>) {
    let mut atoms = Vec::new();
    let mut ids = Vec::with_capacity(fields.len());
    for field in fields {
        let (id, field_atoms) = AtomValue::Bytes(field.to_vec()).to_atoms();
        ids.push(id);
        atoms.extend(field_atoms);
    }
    let (id, list_atoms) = AtomValue::List(ids).to_atoms();
    atoms.extend(list_atoms);
    (id, atoms)
}

/// Decode a record that must have exactly `expected_len` fields.
pub fn decode_record(
    store: &AtomStore,
    id: &Hash,
    expected_len: usize,
) -> Result<Option<Vec<Vec<u8>>>, ValueError> {
    let ids = match get_value(store, id)? {
        None => return Ok(None),
        Some(AtomValue::List(ids)) => ids,
        Some(other) => {
            return Err(ValueError::WrongKind {
                expected: AtomKind::List,
                found: other.kind(),
            })
        }
    };
    if ids.len() != expected_len {
        return Err(ValueError::FieldCount {
            expected: expected_len,
            actual: ids.len(),
        });
    }

    let mut fields = Vec::with_capacity(ids.len());
    for field_id in &ids {
        match get_value(store, field_id)? {
            None => return Ok(None),
            Some(AtomValue::Bytes(bytes)) => fields.push(bytes),
            Some(other) => {
                return Err(ValueError::WrongKind {
                    expected: AtomKind::Bytes,
                    found: other.kind(),
                })
            }
        }
    }
    Ok(Some(fields))
}
