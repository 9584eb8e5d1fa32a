//! # Block Production
//!
//! The `BlockProducer` turns "the previous block plus an ordered list of
//! candidate transactions" into "the next block, ready to be signed".
//!
//! ## Pipeline
//!
//! ```text
//! 1. CAP      — take at most max(previous.transaction_limit, 1) transactions
//! 2. EXECUTE  — debit sender, bump nonce, route the amount to the recipient
//! 3. FEES     — half (rounded down) burned, the rest to the validator
//! 4. LIMIT    — adapt the transaction limit toward realized demand
//! 5. BUILD    — assemble the ten body fields and seal
//! ```
//!
//! ## Atomicity
//!
//! Everything happens inside a [`WorkingSet`] over the producer's store.
//! One bad transaction aborts the whole attempt and the working set is
//! dropped, so no account, trie node or receipt from a failed attempt ever
//! reaches the store. The previous block's trie is never touched; every
//! attempt starts from its root.
//!
//! ## Recipients
//!
//! | Recipient       | Effect                                               |
//! |-----------------|------------------------------------------------------|
//! | burn address    | amount leaves circulation, nobody is credited         |
//! | treasury        | balance credited, sender's stake raised by `amount`   |
//! | anyone else     | balance credited, account created if absent           |

use std::cmp::Ordering;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Address, ChainConfig, ConfigError, Hash, ZERO32};
use crate::crypto::hash::short_hex;
use crate::storage::account::{Account, AccountError, Accounts};
use crate::storage::block::{Block, BlockError, FailureClass};
use crate::storage::merkle::MerkleTree;
use crate::storage::patricia::{PatriciaTrie, TrieError};
use crate::storage::store::{AtomStore, StoreError, WorkingSet};
use crate::storage::value::{decode_int, encode_int, hash_from_slice, ValueError};
use crate::transaction::{Receipt, Transaction};

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ProductionError {
    #[error("previous block has no `{0}`")]
    MissingPreviousField(&'static str),

    #[error("sender {0} has no account")]
    UnknownSender(String),

    #[error("nonce mismatch for {account}: account at {expected}, transaction has {got}")]
    NonceMismatch {
        account: String,
        expected: u64,
        got: u64,
    },

    #[error("insufficient balance for {account}: has {balance}, needs {cost}")]
    InsufficientBalance {
        account: String,
        balance: u64,
        cost: u64,
    },

    #[error("{0} overflows u64")]
    Overflow(&'static str),

    #[error("treasury data hash is not a 32-byte stake root ({0} bytes)")]
    BadStakeRoot(usize),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Block(#[from] BlockError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Trie(#[from] TrieError),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ProductionError {
    pub fn class(&self) -> FailureClass {
        let by_shape = |malformed: bool| {
            if malformed {
                FailureClass::Malformed
            } else {
                FailureClass::Unverifiable
            }
        };
        match self {
            Self::MissingPreviousField(_) => FailureClass::Unverifiable,
            Self::UnknownSender(_)
            | Self::NonceMismatch { .. }
            | Self::InsufficientBalance { .. }
            | Self::Overflow(_)
            | Self::Config(_) => FailureClass::Invalid,
            Self::BadStakeRoot(_) => FailureClass::Malformed,
            Self::Block(e) => e.class(),
            Self::Account(e) => by_shape(e.is_malformed()),
            Self::Trie(e) => by_shape(e.is_malformed()),
            Self::Value(e) => by_shape(e.is_malformed()),
            Self::Store(e) => by_shape(e.is_malformed()),
        }
    }
}

// ---------------------------------------------------------------------------
// Pure rules
// ---------------------------------------------------------------------------

/// Transaction limit for the next block.
///
/// `threshold = floor(max(prev_limit, 1) * natural_rate)`. A count above
/// the threshold becomes the new limit, a count below it decays the limit
/// to the threshold (never under 1), and a count exactly at it keeps the
/// limit unchanged.
pub fn next_transaction_limit(prev_limit: u64, prev_count: u64, natural_rate: f64) -> u64 {
    let limit = prev_limit.max(1);
    let threshold = (limit as f64 * natural_rate).floor() as u64;
    match prev_count.cmp(&threshold) {
        Ordering::Greater => prev_count,
        Ordering::Less => threshold.max(1),
        Ordering::Equal => limit,
    }
}

/// `(burn, reward)`: the burn gets the rounded-down half.
pub fn split_fees(total_fees: u64) -> (u64, u64) {
    let burn = total_fees / 2;
    (burn, total_fees - burn)
}

// ---------------------------------------------------------------------------
// Producer
// ---------------------------------------------------------------------------

/// A freshly produced block and what went into it.
#[derive(Debug, Clone)]
pub struct ProducedBlock {
    /// Sealed, unsigned. Sign it before storing.
    pub block: Block,
    /// One receipt per effective transaction, in order.
    pub receipts: Vec<Receipt>,
    /// How many of the candidate transactions were processed.
    pub effective_transactions: usize,
}

#[derive(Debug, Clone)]
pub struct BlockProducer {
    store: AtomStore,
    config: ChainConfig,
}

impl BlockProducer {
    pub fn new(store: AtomStore, config: ChainConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn store(&self) -> &AtomStore {
        &self.store
    }

    /// Build the block after `previous`.
    ///
    /// On success the new ledger state, transaction records and receipts
    /// are committed to the store. On error nothing is.
    pub fn produce(
        &self,
        previous: &Arc<Block>,
        transactions: &[Transaction],
        validator: &Address,
    ) -> Result<ProducedBlock, ProductionError> {
        let number = previous
            .number
            .ok_or(ProductionError::MissingPreviousField("number"))?
            .checked_add(1)
            .ok_or(ProductionError::Overflow("block number"))?;
        let timestamp = previous
            .timestamp
            .ok_or(ProductionError::MissingPreviousField("timestamp"))?
            .checked_add(1)
            .ok_or(ProductionError::Overflow("timestamp"))?;
        let previous_accounts = previous
            .accounts_hash
            .ok_or(ProductionError::MissingPreviousField("accounts_hash"))?;

        let limit = previous.transaction_limit.max(1);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        let effective = &transactions[..transactions.len().min(take)];

        info!(
            number,
            previous = %short_hex(&previous.hash),
            candidates = transactions.len(),
            effective = effective.len(),
            "producing block"
        );

        let working_set = self.store.working_set();
        let built = self.execute(&working_set, previous_accounts, effective, validator);
        let (accounts_root, total_fees, receipts) = match built {
            Ok(parts) => parts,
            Err(e) => {
                warn!(number, class = %e.class(), error = %e, "block production aborted");
                return Err(e);
            }
        };

        let tx_hashes: Vec<Hash> = effective.iter().map(Transaction::hash).collect();
        let receipt_ids: Vec<Hash> = receipts.iter().map(Receipt::id).collect();

        let mut block = Block {
            previous_block_hash: previous.hash,
            number: Some(number),
            timestamp: Some(timestamp),
            accounts_hash: Some(accounts_root),
            transactions_total_fees: Some(total_fees),
            transactions_hash: Some(MerkleTree::from_hashes(&tx_hashes).root()),
            receipts_hash: Some(MerkleTree::from_hashes(&receipt_ids).root()),
            delay_difficulty: previous.delay_difficulty,
            delay_output: Vec::new(),
            validator_public_key: Some(*validator),
            transaction_limit: next_transaction_limit(
                previous.transaction_limit,
                previous.transactions_count,
                self.config.natural_rate,
            ),
            transactions_count: effective.len() as u64,
            ..Block::default()
        };
        block.attach_previous(previous);
        block.seal();

        let committed = working_set.commit()?;
        info!(
            number,
            block = %short_hex(&block.hash),
            transactions = effective.len(),
            total_fees,
            next_limit = block.transaction_limit,
            objects = committed,
            "block produced"
        );

        Ok(ProducedBlock {
            block,
            receipts,
            effective_transactions: effective.len(),
        })
    }

    /// Apply `effective` and the fee split on top of the previous ledger.
    /// Returns the new accounts root, the fee total and the receipts.
    fn execute(
        &self,
        working_set: &WorkingSet,
        previous_accounts: Hash,
        effective: &[Transaction],
        validator: &Address,
    ) -> Result<(Hash, u64, Vec<Receipt>), ProductionError> {
        let store = working_set.store();
        let mut accounts = Accounts::at_root(previous_accounts);
        let mut total_fees = 0u64;
        let mut receipts = Vec::with_capacity(effective.len());

        for tx in effective {
            let receipt = self.apply_transaction(store, &mut accounts, tx)?;
            total_fees = total_fees
                .checked_add(tx.fee)
                .ok_or(ProductionError::Overflow("total fees"))?;
            let (_, atoms) = receipt.to_atoms();
            store.put_atoms(&atoms)?;
            receipts.push(receipt);
        }

        let (burn, reward) = split_fees(total_fees);
        if burn > 0 {
            credit(store, &mut accounts, &self.config.burn_address, burn)?;
        }
        if reward > 0 {
            credit(store, &mut accounts, validator, reward)?;
        }

        Ok((accounts.root_hash(), total_fees, receipts))
    }

    fn apply_transaction(
        &self,
        store: &AtomStore,
        accounts: &mut Accounts,
        tx: &Transaction,
    ) -> Result<Receipt, ProductionError> {
        let mut sender = accounts
            .get_account(store, &tx.sender)?
            .ok_or_else(|| ProductionError::UnknownSender(hex::encode(tx.sender)))?;
        if sender.nonce != tx.nonce {
            return Err(ProductionError::NonceMismatch {
                account: hex::encode(tx.sender),
                expected: sender.nonce,
                got: tx.nonce,
            });
        }
        let cost = tx.cost().ok_or(ProductionError::Overflow("amount + fee"))?;
        if sender.balance < cost {
            return Err(ProductionError::InsufficientBalance {
                account: hex::encode(tx.sender),
                balance: sender.balance,
                cost,
            });
        }

        sender.balance -= cost;
        sender.nonce = sender
            .nonce
            .checked_add(1)
            .ok_or(ProductionError::Overflow("nonce"))?;
        accounts.set_account(store, &tx.sender, &sender)?;

        if tx.recipient == self.config.burn_address {
            debug!(amount = tx.amount, "transfer to burn address");
        } else if tx.recipient == self.config.treasury_address {
            self.stake(store, accounts, &tx.sender, tx.amount)?;
        } else {
            credit(store, accounts, &tx.recipient, tx.amount)?;
        }

        let tx_hash = tx.store(store)?;
        debug!(tx = %short_hex(&tx_hash), cost, "transaction applied");
        Ok(Receipt::success(tx_hash, cost))
    }

    /// Credit the treasury and add `amount` to `staker`'s entry in the
    /// stake trie rooted at the treasury's `data_hash`.
    fn stake(
        &self,
        store: &AtomStore,
        accounts: &mut Accounts,
        staker: &Address,
        amount: u64,
    ) -> Result<(), ProductionError> {
        let treasury_address = self.config.treasury_address;
        let mut treasury = accounts
            .get_account(store, &treasury_address)?
            .unwrap_or_default();

        let stake_root = match treasury.data_hash.len() {
            0 => ZERO32,
            len => hash_from_slice(&treasury.data_hash).ok_or(ProductionError::BadStakeRoot(len))?,
        };
        let mut stakes = PatriciaTrie::at_root(stake_root);
        let current = match stakes.get(store, staker)? {
            Some(bytes) => decode_int(&bytes)?.unwrap_or(0),
            None => 0,
        };
        let staked = current
            .checked_add(amount)
            .ok_or(ProductionError::Overflow("stake"))?;
        let new_root = stakes.put(store, staker, encode_int(staked))?;

        treasury.balance = treasury
            .balance
            .checked_add(amount)
            .ok_or(ProductionError::Overflow("treasury balance"))?;
        treasury.data_hash = new_root.to_vec();
        accounts.set_account(store, &treasury_address, &treasury)?;

        debug!(staker = %short_hex(staker), staked, "stake updated");
        Ok(())
    }
}

/// Add `amount` to `address`, creating the account if it does not exist.
fn credit(
    store: &AtomStore,
    accounts: &mut Accounts,
    address: &Address,
    amount: u64,
) -> Result<(), ProductionError> {
    let account = match accounts.get_account(store, address)? {
        Some(mut existing) => {
            existing.balance = existing
                .balance
                .checked_add(amount)
                .ok_or(ProductionError::Overflow("balance"))?;
            existing
        }
        None => Account::with_balance(amount),
    };
    accounts.set_account(store, address, &account)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BURN_ADDRESS, DEFAULT_NATURAL_RATE, TREASURY_ADDRESS};
    use crate::consensus::genesis::create_genesis;
    use crate::crypto::keys::ValidatorKeypair;

    const ALICE: Address = [0xa1; 32];
    const BOB: Address = [0xb0; 32];

    struct Fixture {
        store: AtomStore,
        producer: BlockProducer,
        validator: ValidatorKeypair,
    }

    fn fixture() -> Fixture {
        let store = AtomStore::in_memory();
        Fixture {
            producer: BlockProducer::new(store.clone(), ChainConfig::default()),
            store,
            validator: ValidatorKeypair::from_seed(&[3u8; 32]),
        }
    }

    /// A parent block whose ledger gives `balances` to the listed accounts.
    fn funded_parent(fx: &Fixture, balances: &[(Address, u64)], limit: u64) -> Arc<Block> {
        let mut accounts = Accounts::new();
        for (address, balance) in balances {
            accounts
                .set_account(&fx.store, address, &Account::with_balance(*balance))
                .unwrap();
        }
        let mut parent = Block {
            number: Some(4),
            timestamp: Some(1_000),
            accounts_hash: Some(accounts.root_hash()),
            delay_difficulty: Some(12),
            transaction_limit: limit,
            ..Block::default()
        };
        parent.sign(&fx.validator);
        Arc::new(parent)
    }

    fn balance_of(fx: &Fixture, block: &Block, address: &Address) -> Option<u64> {
        Accounts::at_root(block.accounts_hash.unwrap())
            .get_account(&fx.store, address)
            .unwrap()
            .map(|a| a.balance)
    }

    #[test]
    fn adaptive_limit_examples() {
        assert_eq!(next_transaction_limit(10, 7, DEFAULT_NATURAL_RATE), 7);
        assert_eq!(next_transaction_limit(10, 3, DEFAULT_NATURAL_RATE), 6);
        assert_eq!(next_transaction_limit(10, 6, DEFAULT_NATURAL_RATE), 10);
    }

    #[test]
    fn adaptive_limit_floor_is_one() {
        assert_eq!(next_transaction_limit(1, 0, DEFAULT_NATURAL_RATE), 1);
        assert_eq!(next_transaction_limit(0, 0, DEFAULT_NATURAL_RATE), 1);
        assert_eq!(next_transaction_limit(2, 0, DEFAULT_NATURAL_RATE), 1);
        assert_eq!(next_transaction_limit(1, 1, DEFAULT_NATURAL_RATE), 1);
    }

    #[test]
    fn fee_split_examples() {
        assert_eq!(split_fees(9), (4, 5));
        assert_eq!(split_fees(10), (5, 5));
        assert_eq!(split_fees(1), (0, 1));
        assert_eq!(split_fees(0), (0, 0));
    }

    #[test]
    fn produces_next_block_fields() {
        let fx = fixture();
        let parent = funded_parent(&fx, &[(ALICE, 100)], 5);
        let tx = Transaction::new(ALICE, BOB, 30, 9, 0);

        let produced = fx
            .producer
            .produce(&parent, &[tx.clone()], &fx.validator.public_key_bytes())
            .unwrap();
        let block = &produced.block;

        assert_eq!(block.number, Some(5));
        assert_eq!(block.timestamp, Some(1_001));
        assert_eq!(block.previous_block_hash, parent.hash);
        assert_eq!(block.delay_difficulty, Some(12));
        assert_eq!(block.transactions_total_fees, Some(9));
        assert_eq!(block.transactions_count, 1);
        assert!(block.signature.is_none());
        assert_eq!(block.body_hash, Some(block.compute_body_hash()));
        assert_eq!(
            block.transactions_hash,
            Some(MerkleTree::from_hashes(&[tx.hash()]).root())
        );
        assert_eq!(produced.receipts.len(), 1);
        assert_eq!(produced.receipts[0].cost, 39);
        assert_eq!(
            block.receipts_hash,
            Some(MerkleTree::from_hashes(&[produced.receipts[0].id()]).root())
        );
    }

    #[test]
    fn balances_and_fee_split_apply() {
        let fx = fixture();
        let validator = fx.validator.public_key_bytes();
        let parent = funded_parent(&fx, &[(ALICE, 100)], 5);
        let tx = Transaction::new(ALICE, BOB, 30, 9, 0);

        let produced = fx.producer.produce(&parent, &[tx], &validator).unwrap();
        let block = &produced.block;

        assert_eq!(balance_of(&fx, block, &ALICE), Some(61));
        assert_eq!(balance_of(&fx, block, &BOB), Some(30));
        assert_eq!(balance_of(&fx, block, &BURN_ADDRESS), Some(4));
        assert_eq!(balance_of(&fx, block, &validator), Some(5));

        let alice = Accounts::at_root(block.accounts_hash.unwrap())
            .get_account(&fx.store, &ALICE)
            .unwrap()
            .unwrap();
        assert_eq!(alice.nonce, 1);
    }

    #[test]
    fn caps_at_previous_limit() {
        let fx = fixture();
        let parent = funded_parent(&fx, &[(ALICE, 1_000)], 2);
        let txs: Vec<Transaction> = (0..5)
            .map(|nonce| Transaction::new(ALICE, BOB, 1, 0, nonce))
            .collect();

        let produced = fx
            .producer
            .produce(&parent, &txs, &fx.validator.public_key_bytes())
            .unwrap();
        assert_eq!(produced.effective_transactions, 2);
        assert_eq!(produced.block.transactions_count, 2);
        assert_eq!(balance_of(&fx, &produced.block, &BOB), Some(2));
    }

    #[test]
    fn zero_limit_still_takes_one() {
        let fx = fixture();
        let parent = funded_parent(&fx, &[(ALICE, 10)], 0);
        let txs = vec![
            Transaction::new(ALICE, BOB, 1, 0, 0),
            Transaction::new(ALICE, BOB, 1, 0, 1),
        ];
        let produced = fx
            .producer
            .produce(&parent, &txs, &fx.validator.public_key_bytes())
            .unwrap();
        assert_eq!(produced.effective_transactions, 1);
    }

    #[test]
    fn failed_transaction_aborts_atomically() {
        let fx = fixture();
        let parent = funded_parent(&fx, &[(ALICE, 50)], 10);
        let good = Transaction::new(ALICE, BOB, 10, 1, 0);
        let too_big = Transaction::new(ALICE, BOB, 100, 1, 1);

        let err = fx
            .producer
            .produce(&parent, &[good.clone(), too_big], &fx.validator.public_key_bytes())
            .unwrap_err();
        assert!(matches!(err, ProductionError::InsufficientBalance { .. }));
        assert_eq!(err.class(), FailureClass::Invalid);

        // The good transaction's record was only ever staged.
        assert!(fx.store.get(&good.hash()).unwrap().is_none());
        assert_eq!(balance_of(&fx, &parent, &BOB), None);
        assert_eq!(balance_of(&fx, &parent, &ALICE), Some(50));
    }

    #[test]
    fn nonce_mismatch_is_invalid() {
        let fx = fixture();
        let parent = funded_parent(&fx, &[(ALICE, 50)], 10);
        let err = fx
            .producer
            .produce(
                &parent,
                &[Transaction::new(ALICE, BOB, 1, 0, 3)],
                &fx.validator.public_key_bytes(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ProductionError::NonceMismatch {
                expected: 0,
                got: 3,
                ..
            }
        ));
    }

    #[test]
    fn unknown_sender_is_invalid() {
        let fx = fixture();
        let parent = funded_parent(&fx, &[(ALICE, 50)], 10);
        let err = fx
            .producer
            .produce(
                &parent,
                &[Transaction::new([0xee; 32], BOB, 1, 0, 0)],
                &fx.validator.public_key_bytes(),
            )
            .unwrap_err();
        assert!(matches!(err, ProductionError::UnknownSender(_)));
        assert_eq!(err.class(), FailureClass::Invalid);
    }

    #[test]
    fn transfer_to_burn_credits_nobody() {
        let fx = fixture();
        let parent = funded_parent(&fx, &[(ALICE, 50)], 10);
        let produced = fx
            .producer
            .produce(
                &parent,
                &[Transaction::new(ALICE, BURN_ADDRESS, 20, 0, 0)],
                &fx.validator.public_key_bytes(),
            )
            .unwrap();
        assert_eq!(balance_of(&fx, &produced.block, &ALICE), Some(30));
        assert_eq!(balance_of(&fx, &produced.block, &BURN_ADDRESS), None);
    }

    #[test]
    fn transfer_to_treasury_stakes() {
        let fx = fixture();
        let validator = fx.validator.public_key_bytes();
        let genesis = Arc::new(create_genesis(&fx.store, &fx.validator, fx.producer.config()).unwrap());

        // Fund alice through a first block paid by nobody: seed directly.
        let mut accounts = Accounts::at_root(genesis.accounts_hash.unwrap());
        accounts
            .set_account(&fx.store, &ALICE, &Account::with_balance(100))
            .unwrap();
        let mut parent = (*genesis).clone();
        parent.accounts_hash = Some(accounts.root_hash());
        parent.sign(&fx.validator);
        let parent = Arc::new(parent);

        let txs = [Transaction::new(ALICE, TREASURY_ADDRESS, 40, 0, 0)];
        let produced = fx.producer.produce(&parent, &txs, &validator).unwrap();

        let accounts = Accounts::at_root(produced.block.accounts_hash.unwrap());
        let treasury = accounts
            .get_account(&fx.store, &TREASURY_ADDRESS)
            .unwrap()
            .unwrap();
        assert_eq!(treasury.balance, 41);

        let stakes = PatriciaTrie::at_root(hash_from_slice(&treasury.data_hash).unwrap());
        assert_eq!(stakes.get(&fx.store, &ALICE).unwrap(), Some(encode_int(40)));
        assert_eq!(stakes.get(&fx.store, &validator).unwrap(), Some(encode_int(1)));
    }

    #[test]
    fn next_limit_recorded_on_block() {
        let fx = fixture();
        let mut parent = (*funded_parent(&fx, &[(ALICE, 50)], 10)).clone();
        parent.transactions_count = 7;
        let parent = Arc::new(parent);
        let produced = fx
            .producer
            .produce(&parent, &[], &fx.validator.public_key_bytes())
            .unwrap();
        assert_eq!(produced.block.transaction_limit, 7);
        assert_eq!(produced.block.transactions_total_fees, Some(0));
        assert_eq!(produced.block.transactions_hash, Some(ZERO32));
    }

    #[test]
    fn produced_block_links_to_previous() {
        let fx = fixture();
        let parent = funded_parent(&fx, &[(ALICE, 50)], 10);
        let produced = fx
            .producer
            .produce(&parent, &[], &fx.validator.public_key_bytes())
            .unwrap();
        let linked = produced.block.attached_previous().unwrap();
        assert_eq!(linked.hash, parent.hash);
    }

    #[test]
    fn missing_previous_number_is_unverifiable() {
        let fx = fixture();
        let parent = Arc::new(Block {
            timestamp: Some(1),
            ..Block::default()
        });
        let err = fx
            .producer
            .produce(&parent, &[], &fx.validator.public_key_bytes())
            .unwrap_err();
        assert_eq!(err.class(), FailureClass::Unverifiable);
    }

    #[test]
    fn missing_previous_accounts_hash_is_unverifiable() {
        let fx = fixture();
        let parent = Arc::new(Block {
            number: Some(3),
            timestamp: Some(10),
            ..Block::default()
        });
        let err = fx
            .producer
            .produce(&parent, &[], &fx.validator.public_key_bytes())
            .unwrap_err();
        assert!(matches!(
            err,
            ProductionError::MissingPreviousField("accounts_hash")
        ));
        assert_eq!(err.class(), FailureClass::Unverifiable);
        assert_eq!(fx.store.cached_len(), 0);
    }
}
