//! # Block Validation
//!
//! Two checks, both mandatory:
//!
//! 1. **Signature.** `signature` must be a valid Ed25519 signature by
//!    `validator_public_key` over `body_hash`, and `body_hash` must be the
//!    id of the block's ten body fields as they stand now.
//! 2. **Timestamp.** Unless the block is genesis, its timestamp must be at
//!    least one past its predecessor's. The predecessor is taken from the
//!    attached in-memory reference when there is one, and otherwise fetched
//!    through a [`BlockResolver`].
//!
//! A block passes only if both checks ran and passed. Missing inputs make
//! the result [`FailureClass::Unverifiable`], never valid and never invalid.

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Hash;
use crate::crypto::hash::short_hex;
use crate::crypto::signatures::{verify_raw, SignatureError};
use crate::storage::block::{Block, BlockError, FailureClass};
use crate::storage::store::AtomStore;

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Looks up blocks by id. `Ok(None)` means "not available here".
pub trait BlockResolver {
    fn resolve_block(&self, id: &Hash) -> Result<Option<Block>, BlockError>;
}

impl BlockResolver for AtomStore {
    fn resolve_block(&self, id: &Hash) -> Result<Option<Block>, BlockError> {
        Block::decode(self, id)
    }
}

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("block field `{0}` is missing")]
    MissingField(&'static str),

    #[error("previous block {0} is not available")]
    PreviousBlockUnavailable(String),

    #[error("previous block {id} could not be read: {source}")]
    PreviousBlockUnreadable {
        id: String,
        #[source]
        source: BlockError,
    },

    #[error("previous block {0} has no timestamp")]
    PreviousTimestampMissing(String),

    #[error("signature is {0} bytes, expected 64")]
    MalformedSignature(usize),

    #[error("validator public key is not an Ed25519 point")]
    BadPublicKey,

    #[error("signature does not verify against the body hash")]
    InvalidSignature,

    #[error("body hash {claimed} does not match the body fields ({computed})")]
    BodyHashMismatch { claimed: String, computed: String },

    #[error("non-monotonic timestamp: previous {previous}, current {current}")]
    NonMonotonicTimestamp { previous: u64, current: u64 },
}

impl ValidationError {
    pub fn class(&self) -> FailureClass {
        match self {
            Self::MissingField(_)
            | Self::PreviousBlockUnavailable(_)
            | Self::PreviousBlockUnreadable { .. }
            | Self::PreviousTimestampMissing(_) => FailureClass::Unverifiable,
            Self::MalformedSignature(_) => FailureClass::Malformed,
            Self::BadPublicKey
            | Self::InvalidSignature
            | Self::BodyHashMismatch { .. }
            | Self::NonMonotonicTimestamp { .. } => FailureClass::Invalid,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate `block` against its signature and its predecessor.
pub fn validate_block<R: BlockResolver + ?Sized>(
    block: &Block,
    resolver: &R,
) -> Result<(), ValidationError> {
    let result = check_signature(block).and_then(|current| check_timestamp(block, current, resolver));
    match &result {
        Ok(()) => debug!(block = %short_hex(&block.hash), number = ?block.number, "block valid"),
        Err(e) => warn!(
            block = %short_hex(&block.hash),
            class = %e.class(),
            error = %e,
            "block rejected"
        ),
    }
    result
}

/// Returns the block's timestamp once the signature has checked out.
fn check_signature(block: &Block) -> Result<u64, ValidationError> {
    let body_hash = block.body_hash.ok_or(ValidationError::MissingField("body_hash"))?;
    let signature = block
        .signature
        .as_deref()
        .ok_or(ValidationError::MissingField("signature"))?;
    let public_key = block
        .validator_public_key
        .ok_or(ValidationError::MissingField("validator_public_key"))?;
    let timestamp = block.timestamp.ok_or(ValidationError::MissingField("timestamp"))?;

    verify_raw(&public_key, &body_hash, signature).map_err(|e| match e {
        SignatureError::InvalidSignatureBytes(len) => ValidationError::MalformedSignature(len),
        SignatureError::InvalidPublicKey(_) | SignatureError::NotACurvePoint => {
            ValidationError::BadPublicKey
        }
        SignatureError::VerificationFailed => ValidationError::InvalidSignature,
    })?;

    let computed = block.compute_body_hash();
    if computed != body_hash {
        return Err(ValidationError::BodyHashMismatch {
            claimed: hex::encode(body_hash),
            computed: hex::encode(computed),
        });
    }
    Ok(timestamp)
}

fn check_timestamp<R: BlockResolver + ?Sized>(
    block: &Block,
    current: u64,
    resolver: &R,
) -> Result<(), ValidationError> {
    if block.is_genesis() {
        return Ok(());
    }

    let previous_id = block.previous_block_hash;
    let previous_timestamp = match block.attached_previous() {
        Some(previous) => previous.timestamp,
        None => resolver
            .resolve_block(&previous_id)
            .map_err(|source| ValidationError::PreviousBlockUnreadable {
                id: hex::encode(previous_id),
                source,
            })?
            .ok_or_else(|| ValidationError::PreviousBlockUnavailable(hex::encode(previous_id)))?
            .timestamp,
    };
    let previous = previous_timestamp
        .ok_or_else(|| ValidationError::PreviousTimestampMissing(hex::encode(previous_id)))?;

    match previous.checked_add(1) {
        Some(min) if current >= min => Ok(()),
        _ => Err(ValidationError::NonMonotonicTimestamp { previous, current }),
    }
}
