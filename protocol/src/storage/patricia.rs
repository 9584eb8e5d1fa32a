//! # Binary Patricia Trie
//!
//! A persistent radix trie over bit strings. Every node carries a run of
//! key bits, an optional value and up to two children; one routing bit is
//! consumed between a node and the child it selects.
//!
//! ```text
//!            [key_bits = 0110, value = None]
//!              /0                    \1
//!   [101, value = v1]          [ε, value = v2]
//! ```
//!
//! Lookups cost one node per divergence point, bounded by the key's bit
//! length and independent of how many keys are stored.
//!
//! ## Persistence
//!
//! Nodes are content-addressed blobs (`id = BLAKE3(serialized node)`) in an
//! [`AtomStore`]. `put` rebuilds only the nodes on the path from the root
//! to the changed key. Every untouched subtree keeps its id, and every old
//! root stays readable.
//!
//! ## Node serialization
//!
//! ```text
//! key_len: u32 BE
//! key_bits: ceil(key_len / 8) bytes, MSB first, unused trailing bits zero
//! flags: u8   (bit 0 = value, bit 1 = child_0, bit 2 = child_1)
//! child_0: 32 bytes   (if flagged)
//! child_1: 32 bytes   (if flagged)
//! value_len: u32 BE ‖ value   (if flagged)
//! ```
//!
//! ## Shape invariant
//!
//! A node without a value has zero or two children. A node that terminates
//! a key may also route a single longer key, since keys may be prefixes of
//! one another.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::store::{AtomStore, StoreError};
use crate::config::{Hash, EMPTY_TRIE_ROOT, HASH_LENGTH};
use crate::crypto::hash::short_hex;

const FLAG_VALUE: u8 = 0b001;
const FLAG_CHILD_0: u8 = 0b010;
const FLAG_CHILD_1: u8 = 0b100;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TrieError {
    /// A node referenced from a reachable parent is not in any store tier.
    #[error("trie node {0} is missing from the store")]
    MissingNode(String),

    #[error("malformed trie node: {0}")]
    MalformedNode(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TrieError {
    pub fn is_malformed(&self) -> bool {
        match self {
            Self::MalformedNode(_) => true,
            Self::Store(e) => e.is_malformed(),
            Self::MissingNode(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Bit helpers
// ---------------------------------------------------------------------------

/// Bit `index` of `bytes`, most significant bit first.
#[inline]
fn bit(bytes: &[u8], index: usize) -> bool {
    (bytes[index / 8] >> (7 - (index % 8))) & 1 == 1
}

/// Copy `len` bits of `src` starting at `start` into a fresh MSB-first buffer.
fn extract_bits(src: &[u8], start: usize, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len.div_ceil(8)];
    for i in 0..len {
        if bit(src, start + i) {
            out[i / 8] |= 0x80 >> (i % 8);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// PatriciaNode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatriciaNode {
    pub key_len: u32,
    pub key_bits: Vec<u8>,
    pub value: Option<Vec<u8>>,
    pub child_0: Option<Hash>,
    pub child_1: Option<Hash>,
}

impl PatriciaNode {
    fn leaf(key_bits: Vec<u8>, key_len: usize, value: Vec<u8>) -> Self {
        Self {
            key_len: key_len as u32,
            key_bits,
            value: Some(value),
            child_0: None,
            child_1: None,
        }
    }

    pub fn child(&self, routing_bit: bool) -> Option<Hash> {
        if routing_bit {
            self.child_1
        } else {
            self.child_0
        }
    }

    fn set_child(&mut self, routing_bit: bool, id: Hash) {
        if routing_bit {
            self.child_1 = Some(id);
        } else {
            self.child_0 = Some(id);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(5 + self.key_bits.len() + 2 * HASH_LENGTH);
        out.extend_from_slice(&self.key_len.to_be_bytes());
        out.extend_from_slice(&self.key_bits);

        let mut flags = 0u8;
        if self.value.is_some() {
            flags |= FLAG_VALUE;
        }
        if self.child_0.is_some() {
            flags |= FLAG_CHILD_0;
        }
        if self.child_1.is_some() {
            flags |= FLAG_CHILD_1;
        }
        out.push(flags);

        if let Some(c0) = &self.child_0 {
            out.extend_from_slice(c0);
        }
        if let Some(c1) = &self.child_1 {
            out.extend_from_slice(c1);
        }
        if let Some(value) = &self.value {
            out.extend_from_slice(&(value.len() as u32).to_be_bytes());
            out.extend_from_slice(value);
        }
        out
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, TrieError> {
        let mut reader = Reader { buf, pos: 0 };

        let key_len = u32::from_be_bytes(reader.array::<4>()?);
        let key_bits = reader.take((key_len as usize).div_ceil(8))?.to_vec();
        if key_len % 8 != 0 {
            if let Some(last) = key_bits.last() {
                let unused = 8 - (key_len % 8);
                if last & ((1u8 << unused) - 1) != 0 {
                    return Err(TrieError::MalformedNode("non-zero padding bits"));
                }
            }
        }

        let flags = reader.array::<1>()?[0];
        if flags & !(FLAG_VALUE | FLAG_CHILD_0 | FLAG_CHILD_1) != 0 {
            return Err(TrieError::MalformedNode("unknown flag bits"));
        }
        let child_0 = if flags & FLAG_CHILD_0 != 0 {
            Some(reader.array::<HASH_LENGTH>()?)
        } else {
            None
        };
        let child_1 = if flags & FLAG_CHILD_1 != 0 {
            Some(reader.array::<HASH_LENGTH>()?)
        } else {
            None
        };
        let value = if flags & FLAG_VALUE != 0 {
            let len = u32::from_be_bytes(reader.array::<4>()?) as usize;
            Some(reader.take(len)?.to_vec())
        } else {
            None
        };

        if reader.pos != buf.len() {
            return Err(TrieError::MalformedNode("trailing bytes"));
        }
        if value.is_none() && (child_0.is_none() || child_1.is_none()) {
            return Err(TrieError::MalformedNode("valueless node without two children"));
        }

        Ok(Self {
            key_len,
            key_bits,
            value,
            child_0,
            child_1,
        })
    }

    pub fn id(&self) -> Hash {
        crate::crypto::hash::blake3_hash(&self.to_bytes())
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], TrieError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or(TrieError::MalformedNode("truncated node"))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], TrieError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// PatriciaTrie
// ---------------------------------------------------------------------------

/// A handle on one version of a trie: a root id plus a decoded-node cache.
///
/// Cloning is cheap and clones share the node cache. `put` only moves this
/// handle's root, so a clone taken earlier keeps reading the old version.
#[derive(Clone, Debug, Default)]
pub struct PatriciaTrie {
    root: Option<Hash>,
    nodes: Arc<RwLock<HashMap<Hash, Arc<PatriciaNode>>>>,
}

impl PatriciaTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the trie version whose root is `root`. [`EMPTY_TRIE_ROOT`]
    /// opens an empty trie.
    pub fn at_root(root: Hash) -> Self {
        Self {
            root: (root != EMPTY_TRIE_ROOT).then_some(root),
            nodes: Arc::default(),
        }
    }

    pub fn root_hash(&self) -> Hash {
        self.root.unwrap_or(EMPTY_TRIE_ROOT)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Load a node by id, caching it on first fetch.
    pub fn node(&self, store: &AtomStore, id: &Hash) -> Result<Arc<PatriciaNode>, TrieError> {
        if let Some(node) = self.nodes.read().get(id) {
            return Ok(node.clone());
        }
        let bytes = store
            .get_blob(id)?
            .ok_or_else(|| TrieError::MissingNode(hex::encode(id)))?;
        let node = Arc::new(PatriciaNode::from_bytes(&bytes)?);
        self.nodes.write().insert(*id, node.clone());
        Ok(node)
    }

    pub fn root_node(&self, store: &AtomStore) -> Result<Option<Arc<PatriciaNode>>, TrieError> {
        self.root.map(|root| self.node(store, &root)).transpose()
    }

    /// Look up `key`. Absent keys are `Ok(None)`.
    pub fn get(&self, store: &AtomStore, key: &[u8]) -> Result<Option<Vec<u8>>, TrieError> {
        let Some(mut id) = self.root else {
            return Ok(None);
        };
        let total = key.len() * 8;
        let mut offset = 0usize;

        loop {
            let node = self.node(store, &id)?;
            let key_len = node.key_len as usize;
            if offset + key_len > total {
                return Ok(None);
            }
            if (0..key_len).any(|i| bit(&node.key_bits, i) != bit(key, offset + i)) {
                return Ok(None);
            }
            offset += key_len;

            if offset == total {
                return Ok(node.value.clone());
            }

            let Some(child) = node.child(bit(key, offset)) else {
                return Ok(None);
            };
            offset += 1;
            id = child;
        }
    }

    /// Insert or overwrite `key`. Returns the new root id.
    pub fn put(&mut self, store: &AtomStore, key: &[u8], value: Vec<u8>) -> Result<Hash, TrieError> {
        let root = self.insert(store, self.root, key, 0, value)?;
        debug!(
            old_root = %short_hex(&self.root_hash()),
            new_root = %short_hex(&root),
            "trie root updated"
        );
        self.root = Some(root);
        Ok(root)
    }

    fn insert(
        &self,
        store: &AtomStore,
        node_id: Option<Hash>,
        key: &[u8],
        offset: usize,
        value: Vec<u8>,
    ) -> Result<Hash, TrieError> {
        let total = key.len() * 8;
        let remaining = total - offset;

        let Some(node_id) = node_id else {
            let leaf = PatriciaNode::leaf(extract_bits(key, offset, remaining), remaining, value);
            return self.write(store, leaf);
        };
        let node = self.node(store, &node_id)?;
        let node_len = node.key_len as usize;

        let common = (0..node_len.min(remaining))
            .take_while(|&i| bit(&node.key_bits, i) == bit(key, offset + i))
            .count();

        if common == node_len {
            let mut updated = node.as_ref().clone();
            if remaining == node_len {
                if node.value.as_deref() == Some(value.as_slice()) {
                    return Ok(node_id);
                }
                updated.value = Some(value);
            } else {
                let routing = bit(key, offset + node_len);
                let child = self.insert(
                    store,
                    node.child(routing),
                    key,
                    offset + node_len + 1,
                    value,
                )?;
                updated.set_child(routing, child);
            }
            return self.write(store, updated);
        }

        // The key leaves this node's run at bit `common`: split there.
        let node_bit = bit(&node.key_bits, common);
        let suffix_len = node_len - common - 1;
        let suffix = PatriciaNode {
            key_len: suffix_len as u32,
            key_bits: extract_bits(&node.key_bits, common + 1, suffix_len),
            value: node.value.clone(),
            child_0: node.child_0,
            child_1: node.child_1,
        };
        let suffix_id = self.write(store, suffix)?;

        let mut parent = PatriciaNode {
            key_len: common as u32,
            key_bits: extract_bits(&node.key_bits, 0, common),
            value: None,
            child_0: None,
            child_1: None,
        };
        parent.set_child(node_bit, suffix_id);

        if remaining == common {
            parent.value = Some(value);
        } else {
            let leaf_len = remaining - common - 1;
            let leaf = PatriciaNode::leaf(
                extract_bits(key, offset + common + 1, leaf_len),
                leaf_len,
                value,
            );
            let leaf_id = self.write(store, leaf)?;
            parent.set_child(!node_bit, leaf_id);
        }
        self.write(store, parent)
    }

    fn write(&self, store: &AtomStore, node: PatriciaNode) -> Result<Hash, TrieError> {
        let id = store.put_blob(node.to_bytes())?;
        self.nodes.write().insert(id, Arc::new(node));
        Ok(id)
    }
}
