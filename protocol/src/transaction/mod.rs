//! # Transaction Module
//!
//! Value transfers between accounts and the receipts production emits for
//! them.
//!
//! ## Architecture
//!
//! ```text
//! types.rs    — Transaction and its content-addressed hash
//! signing.rs  — Ed25519 signing and verification over the hash
//! receipt.rs  — Per-transaction outcome committed to by the block
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build** — [`Transaction::new`] with sender, recipient, amount, fee, nonce.
//! 2. **Sign** — [`sign_transaction`] with the sender's keypair.
//! 3. **Admit** — the mempool collaborator checks [`verify_transaction`].
//! 4. **Produce** — the block producer applies it and emits a [`Receipt`].
//!
//! ## Design Decisions
//!
//! - The transaction hash is the id of the record
//!   `[amount, fee, nonce, recipient, sender]`. The signature is not part
//!   of it, so signing does not change the hash being signed.
//! - All amounts are `u64` in the smallest unit. No floating point anywhere
//!   near monetary values.

pub mod receipt;
pub mod signing;
pub mod types;

pub use receipt::{Receipt, ReceiptStatus};
pub use signing::{sign_transaction, verify_transaction};
pub use types::Transaction;
