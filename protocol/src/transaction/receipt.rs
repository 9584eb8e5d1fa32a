//! Receipts: the per-transaction outcome a block commits to through
//! `receipts_hash`.

use serde::{Deserialize, Serialize};

use crate::config::Hash;
use crate::storage::atom::Atom;
use crate::storage::value::{encode_int, encode_record};

/// Outcome recorded in a receipt. A transaction that fails aborts the
/// whole block, so every committed receipt is a success.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    Success,
}

impl ReceiptStatus {
    fn code(self) -> u64 {
        match self {
            Self::Success => 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_hash: Hash,
    /// Amount charged to the sender, `amount + fee`.
    pub cost: u64,
    pub status: ReceiptStatus,
}

impl Receipt {
    pub fn success(transaction_hash: Hash, cost: u64) -> Self {
        Self {
            transaction_hash,
            cost,
            status: ReceiptStatus::Success,
        }
    }

    /// Record `[transaction_hash, status, cost]`.
    pub fn to_atoms(&self) -> (Hash, Vec<Atom>) {
        encode_record(&[
            &self.transaction_hash,
            &encode_int(self.status.code()),
            &encode_int(self.cost),
        ])
    }

    pub fn id(&self) -> Hash {
        self.to_atoms().0
    }
}
