//! # AtomStore — Tiered Content-Addressed Store
//!
//! Every object in the consensus core (atoms, trie nodes) is addressed by
//! the hash of its content. This module owns the lookup path:
//!
//! ```text
//! get(id)
//!   │
//!   ├─ hot cache   (decoded atoms, per store instance, never invalidated)
//!   ├─ primary     (MemoryStore or SledStore; receives every write)
//!   └─ fallbacks   (read-only tiers, e.g. a network fetcher)
//! ```
//!
//! Bytes that come back from any tier are re-hashed before use. A tier
//! that hands back the wrong bytes for an id gets a malformed error, and
//! the bytes are neither cached nor promoted.
//!
//! Because ids are content hashes, nothing in a cache can go stale. The
//! cache lives and dies with the `AtomStore` that owns it.
//!
//! ## Working sets
//!
//! [`WorkingSet`] stages writes in an isolated overlay. Block production
//! runs entirely inside one, then either commits it to the parent store or
//! drops it. A failed attempt therefore leaves the parent untouched.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use super::atom::{Atom, AtomError};
use crate::config::{Hash, ZERO32};
use crate::crypto::hash::{blake3_hash, short_hex};

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur while reading or writing objects.
///
/// A plain miss is not an error: lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object {id} failed hash verification")]
    IdMismatch { id: String },

    #[error("malformed atom: {0}")]
    Atom(#[from] AtomError),

    #[error("corrupt metadata entry: {0}")]
    CorruptMetadata(String),

    #[error("storage budget exceeded: {used} + {incoming} bytes > {max}")]
    CapacityExceeded { used: u64, incoming: u64, max: u64 },

    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
}

impl StoreError {
    /// True when the stored bytes themselves are bad, as opposed to the
    /// tier being unavailable or full.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::IdMismatch { .. } | Self::Atom(_) | Self::CorruptMetadata(_)
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// ObjectStore
// ---------------------------------------------------------------------------

/// Raw byte storage keyed by object id.
///
/// This is the seam where the transport layer plugs in: a peer fetcher
/// only has to implement `get_object` and can reject writes.
pub trait ObjectStore: Send + Sync {
    fn get_object(&self, id: &Hash) -> StoreResult<Option<Vec<u8>>>;

    /// Store `bytes` under `id`. Storing an id that is already present is
    /// a no-op.
    fn put_object(&self, id: Hash, bytes: Vec<u8>) -> StoreResult<()>;
}

/// An in-memory object tier.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: DashMap<Hash, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: &Hash) -> bool {
        self.objects.contains_key(id)
    }

    /// Copy out every `(id, bytes)` pair.
    pub fn entries(&self) -> Vec<(Hash, Vec<u8>)> {
        self.objects
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }
}

impl ObjectStore for MemoryStore {
    fn get_object(&self, id: &Hash) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.objects.get(id).map(|bytes| bytes.clone()))
    }

    fn put_object(&self, id: Hash, bytes: Vec<u8>) -> StoreResult<()> {
        self.objects.entry(id).or_insert(bytes);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct StoreStats {
    hot_hits: AtomicU64,
    primary_hits: AtomicU64,
    fallback_hits: AtomicU64,
    misses: AtomicU64,
}

/// Point-in-time copy of a store's hit counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub hot_hits: u64,
    pub primary_hits: u64,
    pub fallback_hits: u64,
    pub misses: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Primary,
    Fallback(usize),
}

// ---------------------------------------------------------------------------
// AtomStore
// ---------------------------------------------------------------------------

/// Content-addressed atom store with an explicit hot cache and tiered
/// backing storage.
///
/// Cloning is cheap and clones share the cache, tiers and counters.
#[derive(Clone)]
pub struct AtomStore {
    cache: Arc<DashMap<Hash, Arc<Atom>>>,
    primary: Arc<dyn ObjectStore>,
    fallbacks: Vec<Arc<dyn ObjectStore>>,
    /// Copy fallback hits into the primary tier.
    promote: bool,
    stats: Arc<StoreStats>,
}

impl std::fmt::Debug for AtomStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomStore")
            .field("cached", &self.cache.len())
            .field("fallbacks", &self.fallbacks.len())
            .finish()
    }
}

impl AtomStore {
    /// A store whose primary tier is the given backend.
    pub fn new(primary: Arc<dyn ObjectStore>) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            primary,
            fallbacks: Vec::new(),
            promote: true,
            stats: Arc::new(StoreStats::default()),
        }
    }

    /// A store backed only by memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Add a read-only tier consulted after the primary misses.
    pub fn with_fallback(mut self, tier: Arc<dyn ObjectStore>) -> Self {
        self.fallbacks.push(tier);
        self
    }

    // -- Atoms ---------------------------------------------------------------

    /// Create-or-find an atom. Returns its id.
    pub fn put(&self, data: impl Into<Vec<u8>>, next: Hash) -> StoreResult<Hash> {
        self.put_atom(&Atom::new(data, next))
    }

    pub fn put_atom(&self, atom: &Atom) -> StoreResult<Hash> {
        let id = atom.object_id();
        if self.cache.contains_key(&id) {
            return Ok(id);
        }
        self.primary.put_object(id, atom.to_bytes())?;
        self.cache.insert(id, Arc::new(atom.clone()));
        Ok(id)
    }

    /// Store several atoms. Returns the number written.
    pub fn put_atoms<'a>(&self, atoms: impl IntoIterator<Item = &'a Atom>) -> StoreResult<usize> {
        let mut count = 0;
        for atom in atoms {
            self.put_atom(atom)?;
            count += 1;
        }
        Ok(count)
    }

    /// Look up an atom by id. `Ok(None)` means no tier has it.
    pub fn get(&self, id: &Hash) -> StoreResult<Option<Atom>> {
        if *id == ZERO32 {
            return Ok(None);
        }
        if let Some(atom) = self.cache.get(id) {
            self.stats.hot_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(atom.as_ref().clone()));
        }

        let Some((bytes, tier)) = self.fetch(id)? else {
            return Ok(None);
        };
        let atom = Atom::from_bytes(&bytes)?;
        if atom.object_id() != *id {
            warn!(id = %short_hex(id), ?tier, "atom bytes do not hash to their id");
            return Err(StoreError::IdMismatch { id: hex::encode(id) });
        }
        self.promote_hit(id, bytes, tier)?;
        self.cache.insert(*id, Arc::new(atom.clone()));
        Ok(Some(atom))
    }

    /// Follow `next` pointers from `head` until the sentinel.
    ///
    /// Returns `Ok(None)` if any link is missing.
    pub fn get_chain(&self, head: &Hash) -> StoreResult<Option<Vec<Atom>>> {
        let mut atoms = Vec::new();
        let mut cursor = *head;
        while cursor != ZERO32 {
            let Some(atom) = self.get(&cursor)? else {
                debug!(head = %short_hex(head), missing = %short_hex(&cursor), "chain link missing");
                return Ok(None);
            };
            cursor = atom.next;
            atoms.push(atom);
        }
        Ok(Some(atoms))
    }

    // -- Blobs ---------------------------------------------------------------

    /// Store raw bytes under `BLAKE3(bytes)`. Trie nodes live here.
    pub fn put_blob(&self, bytes: Vec<u8>) -> StoreResult<Hash> {
        let id = blake3_hash(&bytes);
        self.primary.put_object(id, bytes)?;
        Ok(id)
    }

    /// Fetch a blob and check it hashes to `id`.
    pub fn get_blob(&self, id: &Hash) -> StoreResult<Option<Vec<u8>>> {
        let Some((bytes, tier)) = self.fetch(id)? else {
            return Ok(None);
        };
        if blake3_hash(&bytes) != *id {
            warn!(id = %short_hex(id), ?tier, "blob bytes do not hash to their id");
            return Err(StoreError::IdMismatch { id: hex::encode(id) });
        }
        self.promote_hit(id, bytes.clone(), tier)?;
        Ok(Some(bytes))
    }

    // -- Misc ----------------------------------------------------------------

    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            hot_hits: self.stats.hot_hits.load(Ordering::Relaxed),
            primary_hits: self.stats.primary_hits.load(Ordering::Relaxed),
            fallback_hits: self.stats.fallback_hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
        }
    }

    /// Number of decoded atoms in the hot cache.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Open an isolated staging overlay on top of this store.
    pub fn working_set(&self) -> WorkingSet {
        WorkingSet::new(self.clone())
    }

    fn fetch(&self, id: &Hash) -> StoreResult<Option<(Vec<u8>, Tier)>> {
        if let Some(bytes) = self.primary.get_object(id)? {
            self.stats.primary_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Some((bytes, Tier::Primary)));
        }
        for (index, tier) in self.fallbacks.iter().enumerate() {
            if let Some(bytes) = tier.get_object(id)? {
                self.stats.fallback_hits.fetch_add(1, Ordering::Relaxed);
                debug!(id = %short_hex(id), tier = index, "fallback tier hit");
                return Ok(Some((bytes, Tier::Fallback(index))));
            }
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
    }

    fn promote_hit(&self, id: &Hash, bytes: Vec<u8>, tier: Tier) -> StoreResult<()> {
        if !self.promote || tier == Tier::Primary {
            return Ok(());
        }
        match self.primary.put_object(*id, bytes) {
            Ok(()) => Ok(()),
            // A full primary tier should not turn a successful read into a failure.
            Err(StoreError::CapacityExceeded { .. }) => {
                warn!(id = %short_hex(id), "primary tier full, not promoting fallback hit");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl ObjectStore for AtomStore {
    fn get_object(&self, id: &Hash) -> StoreResult<Option<Vec<u8>>> {
        if let Some(atom) = self.cache.get(id) {
            self.stats.hot_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(atom.to_bytes()));
        }
        Ok(self.fetch(id)?.map(|(bytes, _)| bytes))
    }

    fn put_object(&self, id: Hash, bytes: Vec<u8>) -> StoreResult<()> {
        self.primary.put_object(id, bytes)
    }
}

// ---------------------------------------------------------------------------
// WorkingSet
// ---------------------------------------------------------------------------

/// An isolated write overlay over an [`AtomStore`].
///
/// Reads see the parent plus everything staged. Writes go only to the
/// staging tier until [`commit`](Self::commit). Dropping an uncommitted
/// working set discards its writes.
pub struct WorkingSet {
    staged: Arc<MemoryStore>,
    view: AtomStore,
    parent: AtomStore,
}

impl WorkingSet {
    fn new(parent: AtomStore) -> Self {
        let staged = Arc::new(MemoryStore::new());
        let view = AtomStore {
            cache: Arc::new(DashMap::new()),
            primary: staged.clone(),
            fallbacks: vec![Arc::new(parent.clone())],
            promote: false,
            stats: Arc::new(StoreStats::default()),
        };
        Self {
            staged,
            view,
            parent,
        }
    }

    /// The overlay view. Pass this to anything that should write into the
    /// working set.
    pub fn store(&self) -> &AtomStore {
        &self.view
    }

    /// Number of objects staged so far.
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Publish every staged object to the parent store.
    pub fn commit(self) -> StoreResult<usize> {
        let entries = self.staged.entries();
        let count = entries.len();
        for (id, bytes) in entries {
            self.parent.put_object(id, bytes)?;
        }
        debug!(objects = count, "working set committed");
        Ok(count)
    }
}
