//! End-to-end tests for the Atomchain consensus core.
//!
//! Each test drives the whole lifecycle against a real on-disk store:
//! genesis, production, signing, storage, decoding from the store and
//! validation. Every test owns its own temporary directory.

use std::sync::Arc;

use atomchain_protocol::config::{ChainConfig, BURN_ADDRESS};
use atomchain_protocol::consensus::{
    create_genesis, validate_block, BlockProducer, FailureClass, ProductionError,
};
use atomchain_protocol::crypto::keys::ValidatorKeypair;
use atomchain_protocol::storage::{Account, Accounts, AtomStore, Block, SledStore};
use atomchain_protocol::transaction::{sign_transaction, verify_transaction, Transaction};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

struct Chain {
    _dir: tempfile::TempDir,
    disk: Arc<SledStore>,
    store: AtomStore,
    producer: BlockProducer,
    validator: ValidatorKeypair,
}

fn chain() -> Chain {
    let dir = tempfile::tempdir().unwrap();
    let disk = Arc::new(SledStore::open(dir.path()).unwrap());
    let store = AtomStore::new(disk.clone());
    Chain {
        _dir: dir,
        producer: BlockProducer::new(store.clone(), ChainConfig::default()),
        disk,
        store,
        validator: ValidatorKeypair::from_seed(&[0x11; 32]),
    }
}

/// Genesis plus a premined account: the genesis ledger with `holder`
/// funded, re-signed and stored.
fn premined_genesis(chain: &Chain, holder: &ValidatorKeypair, balance: u64) -> Arc<Block> {
    let mut genesis =
        create_genesis(&chain.store, &chain.validator, chain.producer.config()).unwrap();
    let mut accounts = Accounts::at_root(genesis.accounts_hash.unwrap());
    accounts
        .set_account(
            &chain.store,
            &holder.public_key_bytes(),
            &Account::with_balance(balance),
        )
        .unwrap();
    genesis.accounts_hash = Some(accounts.root_hash());
    genesis.sign(&chain.validator);
    genesis.store(&chain.store).unwrap();
    Arc::new(genesis)
}

/// Produce, sign, store, then read the block back and validate it through
/// the store alone.
fn extend(chain: &Chain, previous: &Arc<Block>, txs: &[Transaction]) -> Arc<Block> {
    let produced = chain
        .producer
        .produce(previous, txs, &chain.validator.public_key_bytes())
        .unwrap();
    let mut block = produced.block;
    block.sign(&chain.validator);
    let id = block.store(&chain.store).unwrap();
    chain.disk.set_head(&id).unwrap();

    let decoded = Block::decode(&chain.store, &id).unwrap().unwrap();
    assert_eq!(decoded, block);
    validate_block(&decoded, &chain.store).unwrap();
    Arc::new(block)
}

fn balance(chain: &Chain, block: &Block, address: &[u8; 32]) -> u64 {
    Accounts::at_root(block.accounts_hash.unwrap())
        .get_account(&chain.store, address)
        .unwrap()
        .map(|a| a.balance)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn genesis_then_empty_blocks() {
    let chain = chain();
    let genesis =
        Arc::new(create_genesis(&chain.store, &chain.validator, chain.producer.config()).unwrap());
    validate_block(&genesis, &chain.store).unwrap();

    let mut tip = genesis.clone();
    for expected in 1..=4u64 {
        tip = extend(&chain, &tip, &[]);
        assert_eq!(tip.number, Some(expected));
        assert_eq!(tip.timestamp, Some(expected));
        assert_eq!(tip.transactions_total_fees, Some(0));
        assert_eq!(tip.accounts_hash, genesis.accounts_hash);
    }
    assert_eq!(chain.disk.head().unwrap(), Some(tip.hash));
}

#[test]
fn signed_transfers_across_blocks() {
    let chain = chain();
    let alice = ValidatorKeypair::from_seed(&[0xa1; 32]);
    let bob = [0xb0; 32];
    let validator = chain.validator.public_key_bytes();
    let mut tip = premined_genesis(&chain, &alice, 1_000);

    for nonce in 0..3u64 {
        let mut tx = Transaction::new(alice.public_key_bytes(), bob, 100, 3, nonce);
        sign_transaction(&mut tx, &alice);
        verify_transaction(&tx).unwrap();
        tip = extend(&chain, &tip, &[tx]);
    }

    assert_eq!(balance(&chain, &tip, &alice.public_key_bytes()), 1_000 - 3 * 103);
    assert_eq!(balance(&chain, &tip, &bob), 300);
    // Each block burns 1 and rewards 2.
    assert_eq!(balance(&chain, &tip, &BURN_ADDRESS), 3);
    assert_eq!(balance(&chain, &tip, &validator), 6);
}

#[test]
fn limit_caps_each_block() {
    let chain = chain();
    let alice = ValidatorKeypair::from_seed(&[0xa2; 32]);
    let genesis = premined_genesis(&chain, &alice, 50);
    let txs: Vec<Transaction> = (0..4)
        .map(|nonce| Transaction::new(alice.public_key_bytes(), [0xcc; 32], 1, 0, nonce))
        .collect();

    let next = extend(&chain, &genesis, &txs);
    assert_eq!(next.transactions_count, 1);
    assert_eq!(balance(&chain, &next, &[0xcc; 32]), 1);

    // The remaining transactions carry on in the following block.
    let after = extend(&chain, &next, &txs[1..]);
    assert_eq!(balance(&chain, &after, &[0xcc; 32]), 2);
}

#[test]
fn failed_production_writes_nothing() {
    let chain = chain();
    let alice = ValidatorKeypair::from_seed(&[0xa3; 32]);
    let genesis = premined_genesis(&chain, &alice, 10);
    chain.disk.flush().unwrap();
    let before = chain.disk.object_count();

    let broke = Transaction::new(alice.public_key_bytes(), [0xdd; 32], 11, 0, 0);
    let err = chain
        .producer
        .produce(&genesis, &[broke], &chain.validator.public_key_bytes())
        .unwrap_err();
    assert!(matches!(err, ProductionError::InsufficientBalance { .. }));
    assert_eq!(err.class(), FailureClass::Invalid);
    assert_eq!(chain.disk.object_count(), before);
}

#[test]
fn tampered_body_fails_validation() {
    let chain = chain();
    let genesis =
        Arc::new(create_genesis(&chain.store, &chain.validator, chain.producer.config()).unwrap());
    let produced = chain
        .producer
        .produce(&genesis, &[], &chain.validator.public_key_bytes())
        .unwrap();
    let mut block = produced.block;
    block.sign(&chain.validator);

    // Change a field after signing and store the result.
    block.timestamp = Some(99);
    block.seal();
    let id = block.store(&chain.store).unwrap();

    let decoded = Block::decode(&chain.store, &id).unwrap().unwrap();
    let err = validate_block(&decoded, &chain.store).unwrap_err();
    assert_eq!(err.class(), FailureClass::Invalid);
}

#[test]
fn chain_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let validator = ValidatorKeypair::from_seed(&[0x22; 32]);
    let head = {
        let disk = Arc::new(SledStore::open(dir.path()).unwrap());
        let store = AtomStore::new(disk.clone());
        let producer = BlockProducer::new(store.clone(), ChainConfig::default());
        let genesis =
            Arc::new(create_genesis(&store, &validator, producer.config()).unwrap());
        let mut block = producer
            .produce(&genesis, &[], &validator.public_key_bytes())
            .unwrap()
            .block;
        block.sign(&validator);
        let id = block.store(&store).unwrap();
        disk.set_head(&id).unwrap();
        disk.flush().unwrap();
        id
    };

    let disk = Arc::new(SledStore::open(dir.path()).unwrap());
    assert_eq!(disk.head().unwrap(), Some(head));
    let store = AtomStore::new(disk);
    let block = Block::decode(&store, &head).unwrap().unwrap();
    assert_eq!(block.number, Some(1));
    validate_block(&block, &store).unwrap();

    let previous = Block::decode(&store, &block.previous_block_hash)
        .unwrap()
        .unwrap();
    assert!(previous.is_genesis());
}
