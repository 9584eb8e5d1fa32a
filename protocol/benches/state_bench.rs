// State and block encoding benchmarks for the Atomchain protocol.
//
// Covers Patricia trie inserts and lookups, Merkle root construction,
// block encode/decode through the atom store, and block validation.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use atomchain_protocol::config::ChainConfig;
use atomchain_protocol::consensus::{create_genesis, validate_block, BlockProducer};
use atomchain_protocol::crypto::blake3_hash;
use atomchain_protocol::crypto::keys::ValidatorKeypair;
use atomchain_protocol::storage::{AtomStore, Block, MerkleTree, PatriciaTrie};

fn keys(n: usize) -> Vec<[u8; 32]> {
    (0..n as u64).map(|i| blake3_hash(&i.to_le_bytes())).collect()
}

fn bench_trie_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("trie/put");
    for n in [100usize, 1_000] {
        let keys = keys(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &keys, |b, keys| {
            b.iter(|| {
                let store = AtomStore::in_memory();
                let mut trie = PatriciaTrie::new();
                for key in keys {
                    trie.put(&store, key, key.to_vec()).unwrap();
                }
                trie.root_hash()
            });
        });
    }
    group.finish();
}

fn bench_trie_get(c: &mut Criterion) {
    let keys = keys(1_000);
    let store = AtomStore::in_memory();
    let mut trie = PatriciaTrie::new();
    for key in &keys {
        trie.put(&store, key, key.to_vec()).unwrap();
    }
    // Fresh handle so lookups go through the store rather than the node cache.
    let cold = PatriciaTrie::at_root(trie.root_hash());

    c.bench_function("trie/get_1000", |b| {
        b.iter(|| {
            for key in &keys {
                cold.get(&store, key).unwrap();
            }
        });
    });
}

fn bench_merkle_root(c: &mut Criterion) {
    let mut group = c.benchmark_group("merkle/from_hashes");
    for n in [16usize, 256, 4_096] {
        let hashes = keys(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &hashes, |b, hashes| {
            b.iter(|| MerkleTree::from_hashes(hashes).root());
        });
    }
    group.finish();
}

fn bench_block_codec(c: &mut Criterion) {
    let store = AtomStore::in_memory();
    let validator = ValidatorKeypair::from_seed(&[5u8; 32]);
    let genesis = create_genesis(&store, &validator, &ChainConfig::default()).unwrap();

    c.bench_function("block/encode", |b| b.iter(|| genesis.encode().id));

    c.bench_function("block/decode", |b| {
        b.iter(|| Block::decode(&store, &genesis.hash).unwrap());
    });
}

fn bench_produce_and_validate(c: &mut Criterion) {
    let store = AtomStore::in_memory();
    let validator = ValidatorKeypair::from_seed(&[6u8; 32]);
    let producer = BlockProducer::new(store.clone(), ChainConfig::default());
    let genesis = Arc::new(create_genesis(&store, &validator, producer.config()).unwrap());

    c.bench_function("block/produce_empty", |b| {
        b.iter(|| {
            producer
                .produce(&genesis, &[], &validator.public_key_bytes())
                .unwrap()
        });
    });

    let mut next = producer
        .produce(&genesis, &[], &validator.public_key_bytes())
        .unwrap()
        .block;
    next.sign(&validator);
    next.store(&store).unwrap();

    c.bench_function("block/validate", |b| {
        b.iter(|| validate_block(&next, &store).unwrap());
    });
}

criterion_group!(
    benches,
    bench_trie_put,
    bench_trie_get,
    bench_merkle_root,
    bench_block_codec,
    bench_produce_and_validate,
);
criterion_main!(benches);
