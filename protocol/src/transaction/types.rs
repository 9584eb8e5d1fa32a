//! Core transaction type.

use serde::{Deserialize, Serialize};

use crate::config::{Address, Hash};
use crate::storage::atom::Atom;
use crate::storage::store::{AtomStore, StoreError};
use crate::storage::value::{encode_int, encode_record};

/// A transfer of `amount` from `sender` to `recipient`, paying `fee`.
///
/// Serializes to JSON with hex-encoded addresses and signature, which is
/// the format `atomchain-node produce --transactions` reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(with = "crate::config::hex_address")]
    pub sender: Address,
    #[serde(with = "crate::config::hex_address")]
    pub recipient: Address,
    pub amount: u64,
    pub fee: u64,
    /// Must equal the sender's account nonce at application time.
    pub nonce: u64,
    #[serde(default, with = "hex_signature", skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<u8>>,
}

impl Transaction {
    pub fn new(sender: Address, recipient: Address, amount: u64, fee: u64, nonce: u64) -> Self {
        Self {
            sender,
            recipient,
            amount,
            fee,
            nonce,
            signature: None,
        }
    }

    /// `amount + fee`, or `None` on overflow.
    pub fn cost(&self) -> Option<u64> {
        self.amount.checked_add(self.fee)
    }

    /// Record id and atoms of `[amount, fee, nonce, recipient, sender]`.
    pub fn to_atoms(&self) -> (Hash, Vec<Atom>) {
        encode_record(&[
            &encode_int(self.amount),
            &encode_int(self.fee),
            &encode_int(self.nonce),
            &self.recipient,
            &self.sender,
        ])
    }

    /// The transaction hash. Excludes the signature.
    pub fn hash(&self) -> Hash {
        self.to_atoms().0
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    pub fn store(&self, store: &AtomStore) -> Result<Hash, StoreError> {
        let (id, atoms) = self.to_atoms();
        store.put_atoms(&atoms)?;
        Ok(id)
    }
}

mod hex_signature {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(sig: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match sig {
            Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| hex::decode(s).map_err(D::Error::custom))
            .transpose()
    }
}
