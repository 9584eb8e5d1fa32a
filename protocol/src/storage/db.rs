//! # SledStore — Persistent Object Tier
//!
//! The on-disk tier behind [`AtomStore`](super::store::AtomStore), built on
//! sled's embedded key-value store.
//!
//! ## Tree Layout
//!
//! | Tree       | Key              | Value                          |
//! |------------|------------------|--------------------------------|
//! | `objects`  | object id (32B)  | raw object bytes               |
//! | `metadata` | key (UTF-8)      | value (bytes)                  |
//!
//! Objects are content-addressed, so a key is only ever written once.
//! Re-putting an id that is already present is a no-op and costs nothing
//! against the byte budget.
//!
//! ## Byte Budget
//!
//! The tier tracks the total size of stored object bytes and refuses a
//! write that would push it past `max_space`. The running total is rebuilt
//! by scanning `objects` when the database is opened.

use parking_lot::Mutex;
use sled::{Db, Tree};
use std::path::Path;
use tracing::{debug, info};

use super::store::{ObjectStore, StoreError, StoreResult};
use crate::config::{Hash, StoreConfig, DEFAULT_MAX_STORAGE_SPACE, HASH_LENGTH};

// ---------------------------------------------------------------------------
// Metadata Keys
// ---------------------------------------------------------------------------

/// Well-known key in the `metadata` tree for the current chain head.
const META_HEAD: &[u8] = b"chain_head";

// ---------------------------------------------------------------------------
// SledStore
// ---------------------------------------------------------------------------

/// Persistent object storage with a byte budget.
///
/// # Thread Safety
///
/// sled trees support concurrent reads and writes. The budget check and
/// the insert it guards happen under one mutex so two writers cannot both
/// squeeze past the limit.
#[derive(Debug)]
pub struct SledStore {
    db: Db,
    objects: Tree,
    metadata: Tree,
    max_space: u64,
    used_space: Mutex<u64>,
}

impl SledStore {
    /// Open or create a store at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db, DEFAULT_MAX_STORAGE_SPACE)
    }

    /// Open a store as described by a [`StoreConfig`]. A config without a
    /// path yields a temporary store.
    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        let db = match &config.path {
            Some(path) => sled::open(path)?,
            None => sled::Config::new().temporary(true).open()?,
        };
        Self::from_db(db, config.max_space)
    }

    /// A temporary store that is deleted when dropped. For tests.
    pub fn open_temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db, DEFAULT_MAX_STORAGE_SPACE)
    }

    /// Replace the byte budget.
    pub fn with_max_space(mut self, max_space: u64) -> Self {
        self.max_space = max_space;
        self
    }

    fn from_db(db: Db, max_space: u64) -> StoreResult<Self> {
        let objects = db.open_tree("objects")?;
        let metadata = db.open_tree("metadata")?;

        let mut used = 0u64;
        for entry in objects.iter() {
            let (_key, value) = entry?;
            used += value.len() as u64;
        }
        info!(objects = objects.len(), used_bytes = used, max_space, "object store opened");

        Ok(Self {
            db,
            objects,
            metadata,
            max_space,
            used_space: Mutex::new(used),
        })
    }

    /// Bytes of object data currently stored.
    pub fn current_space(&self) -> u64 {
        *self.used_space.lock()
    }

    pub fn max_space(&self) -> u64 {
        self.max_space
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    // -- Metadata operations ------------------------------------------------

    /// Record the id of the latest accepted block.
    pub fn set_head(&self, block_id: &Hash) -> StoreResult<()> {
        self.metadata.insert(META_HEAD, block_id.as_slice())?;
        Ok(())
    }

    /// The id of the latest accepted block, if one was recorded.
    pub fn head(&self) -> StoreResult<Option<Hash>> {
        match self.metadata.get(META_HEAD)? {
            Some(bytes) if bytes.len() == HASH_LENGTH => {
                let mut head = [0u8; HASH_LENGTH];
                head.copy_from_slice(&bytes);
                Ok(Some(head))
            }
            Some(bytes) => Err(StoreError::CorruptMetadata(format!(
                "chain head is {} bytes",
                bytes.len()
            ))),
            None => Ok(None),
        }
    }

    /// Block until all pending writes are durable.
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl ObjectStore for SledStore {
    fn get_object(&self, id: &Hash) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.objects.get(id)?.map(|bytes| bytes.to_vec()))
    }

    fn put_object(&self, id: Hash, bytes: Vec<u8>) -> StoreResult<()> {
        let mut used = self.used_space.lock();
        if self.objects.contains_key(id)? {
            return Ok(());
        }
        let incoming = bytes.len() as u64;
        if *used + incoming > self.max_space {
            return Err(StoreError::CapacityExceeded {
                used: *used,
                incoming,
                max: self.max_space,
            });
        }
        self.objects.insert(id, bytes)?;
        *used += incoming;
        debug!(id = %crate::crypto::hash::short_hex(&id), bytes = incoming, "object persisted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
