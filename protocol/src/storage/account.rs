//! # Accounts
//!
//! The ledger entry and the trie that holds all of them.
//!
//! An [`Account`] is stored as a three-field record
//! `[balance, data_hash, nonce]`, with both integers in minimal big-endian.
//! The accounts trie maps a 32-byte address to the record id, so the
//! accounts root commits to every balance, nonce and data hash.
//!
//! `data_hash` is opaque here. The treasury account uses it to point at the
//! stake trie root.

use thiserror::Error;

use super::atom::Atom;
use super::patricia::{PatriciaTrie, TrieError};
use super::store::{AtomStore, StoreError};
use super::value::{decode_int, decode_record, encode_int, encode_record, hash_from_slice, ValueError};
use crate::config::{Address, Hash};

const ACCOUNT_FIELDS: usize = 3;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("account record field `{0}` is empty")]
    MissingField(&'static str),

    #[error("accounts trie value for {0} is not a 32-byte record id")]
    BadRecordPointer(String),

    /// The trie points at a record the store does not have.
    #[error("account record {0} is missing from the store")]
    MissingRecord(String),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Trie(#[from] TrieError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AccountError {
    pub fn is_malformed(&self) -> bool {
        match self {
            Self::MissingField(_) | Self::BadRecordPointer(_) => true,
            Self::MissingRecord(_) => false,
            Self::Value(e) => e.is_malformed(),
            Self::Trie(e) => e.is_malformed(),
            Self::Store(e) => e.is_malformed(),
        }
    }
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    pub balance: u64,
    pub data_hash: Vec<u8>,
    pub nonce: u64,
}

impl Account {
    pub fn with_balance(balance: u64) -> Self {
        Self {
            balance,
            ..Self::default()
        }
    }

    /// Record id and atoms, without touching a store.
    pub fn to_atoms(&self) -> (Hash, Vec<Atom>) {
        encode_record(&[
            &encode_int(self.balance),
            &self.data_hash,
            &encode_int(self.nonce),
        ])
    }

    pub fn put(&self, store: &AtomStore) -> Result<Hash, StoreError> {
        let (id, atoms) = self.to_atoms();
        store.put_atoms(&atoms)?;
        Ok(id)
    }

    /// Load an account record. `Ok(None)` if it is not in the store.
    pub fn load(store: &AtomStore, id: &Hash) -> Result<Option<Self>, AccountError> {
        let Some(fields) = decode_record(store, id, ACCOUNT_FIELDS)? else {
            return Ok(None);
        };
        let [balance, data_hash, nonce]: [Vec<u8>; ACCOUNT_FIELDS] = fields
            .try_into()
            .map_err(|_| AccountError::MissingField("record"))?;
        Ok(Some(Self {
            balance: decode_int(&balance)?.ok_or(AccountError::MissingField("balance"))?,
            data_hash,
            nonce: decode_int(&nonce)?.ok_or(AccountError::MissingField("nonce"))?,
        }))
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// The accounts trie: address → account record id.
#[derive(Debug, Clone, Default)]
pub struct Accounts {
    trie: PatriciaTrie,
}

impl Accounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at_root(root: Hash) -> Self {
        Self {
            trie: PatriciaTrie::at_root(root),
        }
    }

    pub fn root_hash(&self) -> Hash {
        self.trie.root_hash()
    }

    pub fn get_account(
        &self,
        store: &AtomStore,
        address: &Address,
    ) -> Result<Option<Account>, AccountError> {
        let Some(pointer) = self.trie.get(store, address)? else {
            return Ok(None);
        };
        let record_id = hash_from_slice(&pointer)
            .ok_or_else(|| AccountError::BadRecordPointer(hex::encode(address)))?;
        Account::load(store, &record_id)?
            .map(Some)
            .ok_or_else(|| AccountError::MissingRecord(hex::encode(record_id)))
    }

    /// Write `account` at `address`. Returns the new accounts root.
    pub fn set_account(
        &mut self,
        store: &AtomStore,
        address: &Address,
        account: &Account,
    ) -> Result<Hash, AccountError> {
        let record_id = account.put(store)?;
        Ok(self.trie.put(store, address, record_id.to_vec())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZERO32;

    #[test]
    fn account_record_round_trip() {
        let store = AtomStore::in_memory();
        let account = Account {
            balance: 1_000,
            data_hash: vec![0xab; 32],
            nonce: 7,
        };
        let id = account.put(&store).unwrap();
        assert_eq!(Account::load(&store, &id).unwrap(), Some(account));
    }

    #[test]
    fn zero_account_round_trip() {
        let store = AtomStore::in_memory();
        let id = Account::default().put(&store).unwrap();
        let loaded = Account::load(&store, &id).unwrap().unwrap();
        assert_eq!(loaded.balance, 0);
        assert_eq!(loaded.nonce, 0);
        assert!(loaded.data_hash.is_empty());
    }

    #[test]
    fn record_id_is_content_addressed() {
        let a = Account::with_balance(5).to_atoms().0;
        let b = Account::with_balance(5).to_atoms().0;
        let c = Account::with_balance(6).to_atoms().0;
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn accounts_trie_get_set() {
        let store = AtomStore::in_memory();
        let mut accounts = Accounts::new();
        assert_eq!(accounts.root_hash(), ZERO32);

        let alice = [0xa1; 32];
        let bob = [0xb0; 32];
        accounts
            .set_account(&store, &alice, &Account::with_balance(100))
            .unwrap();
        let root_one = accounts
            .set_account(&store, &bob, &Account::with_balance(50))
            .unwrap();

        assert_eq!(
            accounts.get_account(&store, &alice).unwrap().unwrap().balance,
            100
        );
        assert!(accounts.get_account(&store, &[0xcc; 32]).unwrap().is_none());

        let mut updated = accounts.get_account(&store, &alice).unwrap().unwrap();
        updated.balance -= 10;
        updated.nonce += 1;
        accounts.set_account(&store, &alice, &updated).unwrap();

        let snapshot = Accounts::at_root(root_one);
        assert_eq!(
            snapshot.get_account(&store, &alice).unwrap().unwrap().balance,
            100
        );
        assert_eq!(
            accounts.get_account(&store, &alice).unwrap().unwrap(),
            updated
        );
    }

    #[test]
    fn dangling_record_is_not_malformed() {
        let store = AtomStore::in_memory();
        let mut trie = PatriciaTrie::new();
        trie.put(&store, &[1u8; 32], vec![9u8; 32]).unwrap();
        let accounts = Accounts::at_root(trie.root_hash());
        let err = accounts.get_account(&store, &[1u8; 32]).unwrap_err();
        assert!(matches!(err, AccountError::MissingRecord(_)));
        assert!(!err.is_malformed());
    }
}
