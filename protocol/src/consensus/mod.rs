//! # Consensus
//!
//! The block rules every node has to agree on.
//!
//! ```text
//! genesis.rs     — the first block and its ledger
//! producer.rs    — previous block + transactions ─► next unsigned block
//! validation.rs  — signature and timestamp checks on a decoded block
//! ```
//!
//! Every failure here reports a [`FailureClass`]. Callers branch on the
//! class, not on the individual error variant: a malformed or invalid block
//! is rejected, an unverifiable one can be retried once the missing data
//! turns up.

pub mod genesis;
pub mod producer;
pub mod validation;

pub use crate::storage::block::FailureClass;
pub use genesis::create_genesis;
pub use producer::{next_transaction_limit, split_fees, BlockProducer, ProducedBlock, ProductionError};
pub use validation::{validate_block, BlockResolver, ValidationError};
