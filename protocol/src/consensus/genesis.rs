//! # Genesis Block
//!
//! Block zero seeds the ledger with three accounts:
//!
//! - the **treasury**, balance 1, whose `data_hash` is the root of a stake
//!   trie holding exactly one entry: the genesis validator with stake 1;
//! - the **burn** account, balance 0;
//! - the **validator**, balance 0.
//!
//! It has no transactions, so both Merkle roots are the empty root, and it
//! is signed like any other block.

use tracing::info;

use crate::config::{
    ChainConfig, ConfigError, GENESIS_STAKE, GENESIS_TRANSACTION_LIMIT, GENESIS_TREASURY_BALANCE,
    ZERO32,
};
use crate::crypto::hash::short_hex;
use crate::crypto::keys::ValidatorKeypair;
use crate::storage::account::{Account, Accounts};
use crate::storage::block::Block;
use crate::storage::patricia::PatriciaTrie;
use crate::storage::store::AtomStore;
use crate::storage::value::encode_int;

use super::producer::ProductionError;

/// Create, sign and store the genesis block for `validator`.
///
/// The ledger objects and the block itself are written through a working
/// set, so a failure leaves the store untouched.
pub fn create_genesis(
    store: &AtomStore,
    validator: &ValidatorKeypair,
    config: &ChainConfig,
) -> Result<Block, ProductionError> {
    config.validate()?;
    let validator_address = validator.public_key_bytes();
    if validator_address == config.treasury_address || validator_address == config.burn_address {
        return Err(ConfigError::ReservedAddressCollision.into());
    }

    let working_set = store.working_set();
    let view = working_set.store();

    let mut stakes = PatriciaTrie::new();
    let stake_root = stakes.put(view, &validator_address, encode_int(GENESIS_STAKE))?;

    let mut accounts = Accounts::new();
    let treasury = Account {
        balance: GENESIS_TREASURY_BALANCE,
        data_hash: stake_root.to_vec(),
        nonce: 0,
    };
    accounts.set_account(view, &config.treasury_address, &treasury)?;
    accounts.set_account(view, &config.burn_address, &Account::default())?;
    accounts.set_account(view, &validator_address, &Account::default())?;

    let mut block = Block {
        previous_block_hash: ZERO32,
        number: Some(0),
        timestamp: Some(config.genesis_timestamp),
        accounts_hash: Some(accounts.root_hash()),
        transactions_total_fees: Some(0),
        transactions_hash: Some(ZERO32),
        receipts_hash: Some(ZERO32),
        delay_difficulty: Some(0),
        transaction_limit: GENESIS_TRANSACTION_LIMIT,
        ..Block::default()
    };
    block.sign(validator);
    block.store(view)?;

    working_set.commit()?;
    info!(
        block = %short_hex(&block.hash),
        validator = %short_hex(&validator_address),
        "genesis block created"
    );
    Ok(block)
}
