//! # Protocol Configuration & Constants
//!
//! Every consensus-relevant constant lives here. Two nodes that disagree on
//! any value in this file are running two different chains, so changes here
//! are hard forks whether you call them that or not.
//!
//! Tunable parameters that an operator may legitimately set (natural rate,
//! genesis timestamp, on-disk budget) live in [`ChainConfig`] and
//! [`StoreConfig`], which serialize to JSON for the node's config file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// A 32-byte digest. Atom ids, trie node ids, Merkle hashes and account
/// addresses all share this shape.
pub type Hash = [u8; 32];

/// Account addresses are Ed25519 public keys (or reserved sentinels).
pub type Address = [u8; 32];

// ---------------------------------------------------------------------------
// Sentinels
// ---------------------------------------------------------------------------

/// The reserved all-zero hash. Means "no successor", "no predecessor" or
/// "empty", depending on where it appears. Never a real object id.
pub const ZERO32: Hash = [0u8; 32];

/// Root hash reported by a trie that has never had a key inserted.
pub const EMPTY_TRIE_ROOT: Hash = ZERO32;

/// Hash used for unoccupied Merkle leaf slots.
pub const EMPTY_LEAF_HASH: Hash = ZERO32;

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// BLAKE3 for atom ids, trie node ids and Merkle nodes.
pub const PRIMARY_HASH_FUNCTION: &str = "BLAKE3";

/// Digest length in bytes.
pub const HASH_LENGTH: usize = 32;

/// Ed25519 public key length in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Block Encoding
// ---------------------------------------------------------------------------

/// Payload of the tag atom that heads every block chain.
pub const BLOCK_TAG: &[u8] = b"block";

/// Number of atoms in a block's top-level chain: tag, signature, body list.
pub const BLOCK_CHAIN_LENGTH: usize = 3;

/// Number of fields in the signed block body. Fixed forever.
pub const BODY_FIELD_COUNT: usize = 10;

// ---------------------------------------------------------------------------
// Economics
// ---------------------------------------------------------------------------

/// Damping factor for the per-block transaction capacity estimator.
/// The golden-ratio conjugate, because something had to be picked.
pub const DEFAULT_NATURAL_RATE: f64 = 0.618;

/// Treasury account. Transfers here are stake deposits.
pub const TREASURY_ADDRESS: Address = [0x01; 32];

/// Burn account. Transfers here vanish; half of all fees land here.
pub const BURN_ADDRESS: Address = ZERO32;

/// Stake the genesis validator starts with.
pub const GENESIS_STAKE: u64 = 1;

/// Balance of the treasury account at genesis.
pub const GENESIS_TREASURY_BALANCE: u64 = 1;

/// Limit assigned to the genesis block. Production floors it at 1 anyway.
pub const GENESIS_TRANSACTION_LIMIT: u64 = 1;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Default byte budget for the on-disk tier. 1 GiB.
pub const DEFAULT_MAX_STORAGE_SPACE: u64 = 1024 * 1024 * 1024;

// ---------------------------------------------------------------------------
// ChainConfig
// ---------------------------------------------------------------------------

/// Errors raised when a configuration value is out of range.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("natural rate must be in (0, 1], got {0}")]
    NaturalRateOutOfRange(f64),

    #[error("treasury and burn addresses must differ")]
    ReservedAddressCollision,

    #[error("config parse error: {0}")]
    Parse(String),
}

/// Chain parameters that every validator on a network must share.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Capacity damping factor. See `consensus::producer::next_transaction_limit`.
    pub natural_rate: f64,
    /// Stake-deposit recipient.
    #[serde(with = "hex_address")]
    pub treasury_address: Address,
    /// Fee-burn and discard recipient.
    #[serde(with = "hex_address")]
    pub burn_address: Address,
    /// Timestamp written into the genesis block.
    pub genesis_timestamp: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            natural_rate: DEFAULT_NATURAL_RATE,
            treasury_address: TREASURY_ADDRESS,
            burn_address: BURN_ADDRESS,
            genesis_timestamp: 0,
        }
    }
}

impl ChainConfig {
    /// Check that every parameter is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.natural_rate > 0.0 && self.natural_rate <= 1.0) {
            return Err(ConfigError::NaturalRateOutOfRange(self.natural_rate));
        }
        if self.treasury_address == self.burn_address {
            return Err(ConfigError::ReservedAddressCollision);
        }
        Ok(())
    }

    /// Parse and validate a JSON config document. Missing fields take
    /// their default values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

/// Where atoms live on disk and how much room they get.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory of the on-disk tier. `None` keeps everything in memory.
    pub path: Option<PathBuf>,
    /// Byte budget for the on-disk tier.
    pub max_space: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_space: DEFAULT_MAX_STORAGE_SPACE,
        }
    }
}

/// Serde adapter: addresses travel as 64-char hex strings in JSON.
pub(crate) mod hex_address {
    use super::Address;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(address))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(D::Error::custom)?;
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| D::Error::custom(format!("address must be 32 bytes, got {}", bytes.len())))
    }
}
