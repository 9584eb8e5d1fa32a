// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Atomchain Validator Node
//!
//! Entry point for the `atomchain-node` binary. Parses CLI arguments,
//! initializes logging, opens the on-disk store and runs one subcommand.
//!
//! - `init`     — data directory, validator key, genesis block
//! - `produce`  — build, sign, validate and store blocks on the head
//! - `inspect`  — print a stored block as JSON
//! - `validate` — re-run validation on a stored block
//! - `version`  — print build version information
//!
//! ## Data Directory
//!
//! ```text
//! <data-dir>/
//!   db/             sled database: atoms + chain head
//!   validator.key   hex secret key, mode 0600
//!   config.json     chain parameters
//! ```

mod cli;
mod logging;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;

use atomchain_protocol::config::{ChainConfig, Hash, StoreConfig, PRIMARY_HASH_FUNCTION};
use atomchain_protocol::consensus::{create_genesis, validate_block, BlockProducer};
use atomchain_protocol::crypto::keys::ValidatorKeypair;
use atomchain_protocol::storage::{AtomStore, Block, SledStore};
use atomchain_protocol::transaction::Transaction;

use cli::{BlockArgs, Commands, InitArgs, NodeCli, NodeDirArgs, ProduceArgs};

const KEY_FILE: &str = "validator.key";
const CONFIG_FILE: &str = "config.json";
const DB_DIR: &str = "db";

fn main() -> Result<()> {
    let cli = NodeCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    match cli.command {
        Commands::Init(args) => init_node(args),
        Commands::Produce(args) => produce_blocks(args),
        Commands::Inspect(args) => inspect_block(args),
        Commands::Validate(args) => validate_stored(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Node state
// ---------------------------------------------------------------------------

/// An opened data directory.
struct Node {
    data_dir: PathBuf,
    disk: Arc<SledStore>,
    store: AtomStore,
    config: ChainConfig,
}

impl Node {
    fn open(dirs: &NodeDirArgs) -> Result<Self> {
        let data_dir = dirs.data_dir.clone();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

        let config = load_config(&data_dir, dirs.config.as_deref())?;

        let db_path = data_dir.join(DB_DIR);
        let store_config = StoreConfig {
            path: Some(db_path.clone()),
            ..StoreConfig::default()
        };
        let disk = Arc::new(
            SledStore::from_config(&store_config)
                .with_context(|| format!("failed to open database at {}", db_path.display()))?,
        );
        let store = AtomStore::new(disk.clone());
        tracing::info!(path = %db_path.display(), "database opened");

        Ok(Self {
            data_dir,
            disk,
            store,
            config,
        })
    }

    fn key_path(&self) -> PathBuf {
        self.data_dir.join(KEY_FILE)
    }

    fn load_key(&self) -> Result<ValidatorKeypair> {
        let path = self.key_path();
        let hex_key = fs::read_to_string(&path)
            .with_context(|| format!("failed to read validator key from {}", path.display()))?;
        ValidatorKeypair::from_hex(&hex_key)
            .with_context(|| format!("bad validator key in {}", path.display()))
    }

    fn head(&self) -> Result<Hash> {
        self.disk
            .head()
            .context("failed to read chain head")?
            .context("no chain head recorded; run `atomchain-node init` first")
    }

    fn load_block(&self, id: &Hash) -> Result<Block> {
        Block::decode(&self.store, id)
            .with_context(|| format!("failed to decode block {}", hex::encode(id)))?
            .with_context(|| format!("block {} is not in the store", hex::encode(id)))
    }

    /// The block named on the command line, or the head.
    fn select_block(&self, block: Option<&str>) -> Result<Block> {
        let id = match block {
            Some(hex_id) => parse_hash(hex_id)?,
            None => self.head()?,
        };
        self.load_block(&id)
    }
}

fn load_config(data_dir: &Path, explicit: Option<&Path>) -> Result<ChainConfig> {
    let default_path = data_dir.join(CONFIG_FILE);
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None if default_path.exists() => default_path,
        None => return Ok(ChainConfig::default()),
    };
    let json = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    ChainConfig::from_json(&json).with_context(|| format!("invalid config {}", path.display()))
}

fn parse_hash(hex_id: &str) -> Result<Hash> {
    let bytes = hex::decode(hex_id.trim()).context("block id is not hex")?;
    match <Hash>::try_from(bytes.as_slice()) {
        Ok(id) => Ok(id),
        Err(_) => bail!("block id must be 32 bytes, got {}", bytes.len()),
    }
}

fn write_key_file(path: &Path, keypair: &ValidatorKeypair) -> Result<()> {
    fs::write(path, hex::encode(keypair.secret_key_bytes()))
        .with_context(|| format!("failed to write validator key to {}", path.display()))?;

    // Restrict permissions on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn init_node(args: InitArgs) -> Result<()> {
    let mut node = Node::open(&args.dirs)?;
    if node.disk.head()?.is_some() {
        bail!("{} already holds a chain", node.data_dir.display());
    }
    if let Some(timestamp) = args.genesis_timestamp {
        node.config.genesis_timestamp = timestamp;
    }

    let keypair = match &args.validator_key {
        Some(hex_key) => ValidatorKeypair::from_hex(hex_key).context("bad --validator-key")?,
        None => ValidatorKeypair::generate(),
    };
    let key_path = node.key_path();
    write_key_file(&key_path, &keypair)?;

    let config_path = node.data_dir.join(CONFIG_FILE);
    if !config_path.exists() {
        let json = serde_json::to_string_pretty(&node.config)?;
        fs::write(&config_path, json)
            .with_context(|| format!("failed to write {}", config_path.display()))?;
    }

    let genesis = create_genesis(&node.store, &keypair, &node.config)
        .context("failed to create genesis block")?;
    node.disk.set_head(&genesis.hash)?;
    node.disk.flush()?;

    tracing::info!(
        public_key = %keypair.public_key_hex(),
        genesis = %hex::encode(genesis.hash),
        "node initialized"
    );

    println!("Node initialized successfully.");
    println!("  Data directory : {}", node.data_dir.display());
    println!("  Validator key  : {}", key_path.display());
    println!("  Public key     : {}", keypair.public_key_hex());
    println!("  Genesis block  : {}", hex::encode(genesis.hash));
    Ok(())
}

fn produce_blocks(args: ProduceArgs) -> Result<()> {
    let node = Node::open(&args.dirs)?;
    let keypair = node.load_key()?;
    let validator = keypair.public_key_bytes();

    let mut pending: Vec<Transaction> = match &args.transactions {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read transactions from {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("invalid transactions file {}", path.display()))?
        }
        None => Vec::new(),
    };

    let producer = BlockProducer::new(node.store.clone(), node.config.clone());
    let mut tip = Arc::new(node.load_block(&node.head()?)?);

    for _ in 0..args.blocks {
        let produced = producer
            .produce(&tip, &pending, &validator)
            .with_context(|| format!("production on {} failed", hex::encode(tip.hash)))?;
        let mut block = produced.block;
        block.sign(&keypair);

        if let Err(e) = validate_block(&block, &node.store) {
            bail!("produced block failed validation ({}): {}", e.class(), e);
        }
        let id = block.store(&node.store)?;
        node.disk.set_head(&id)?;

        pending.drain(..produced.effective_transactions);
        println!(
            "block {} #{} txs={} fees={} next_limit={}",
            hex::encode(id),
            block.number.unwrap_or_default(),
            produced.effective_transactions,
            block.transactions_total_fees.unwrap_or_default(),
            block.transaction_limit,
        );
        tip = Arc::new(block);
    }

    node.disk.flush()?;
    if !pending.is_empty() {
        tracing::warn!(left = pending.len(), "transactions left unprocessed");
    }
    Ok(())
}

/// JSON rendering of a block for `inspect`.
#[derive(Serialize)]
struct BlockView {
    hash: String,
    previous_block_hash: String,
    number: Option<u64>,
    timestamp: Option<u64>,
    accounts_hash: Option<String>,
    transactions_total_fees: Option<u64>,
    transactions_hash: Option<String>,
    receipts_hash: Option<String>,
    delay_difficulty: Option<u64>,
    delay_output: String,
    validator_public_key: Option<String>,
    body_hash: Option<String>,
    signature: Option<String>,
}

impl From<&Block> for BlockView {
    fn from(block: &Block) -> Self {
        Self {
            hash: hex::encode(block.hash),
            previous_block_hash: hex::encode(block.previous_block_hash),
            number: block.number,
            timestamp: block.timestamp,
            accounts_hash: block.accounts_hash.map(hex::encode),
            transactions_total_fees: block.transactions_total_fees,
            transactions_hash: block.transactions_hash.map(hex::encode),
            receipts_hash: block.receipts_hash.map(hex::encode),
            delay_difficulty: block.delay_difficulty,
            delay_output: hex::encode(&block.delay_output),
            validator_public_key: block.validator_public_key.map(hex::encode),
            body_hash: block.body_hash.map(hex::encode),
            signature: block.signature.as_ref().map(hex::encode),
        }
    }
}

fn inspect_block(args: BlockArgs) -> Result<()> {
    let node = Node::open(&args.dirs)?;
    let block = node.select_block(args.block.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&BlockView::from(&block))?);
    Ok(())
}

fn validate_stored(args: BlockArgs) -> Result<()> {
    let node = Node::open(&args.dirs)?;
    let block = node.select_block(args.block.as_deref())?;
    match validate_block(&block, &node.store) {
        Ok(()) => {
            println!("{} valid", hex::encode(block.hash));
            Ok(())
        }
        Err(e) => bail!("{} {}: {}", hex::encode(block.hash), e.class(), e),
    }
}

/// Prints version information to stdout.
fn print_version() {
    println!("atomchain-node {}", env!("CARGO_PKG_VERSION"));
    println!("hash           {}", PRIMARY_HASH_FUNCTION);
    println!("rustc          {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dirs(path: &Path) -> NodeDirArgs {
        NodeDirArgs {
            data_dir: path.to_path_buf(),
            config: None,
        }
    }

    #[test]
    fn init_then_produce_then_validate() {
        let dir = tempfile::tempdir().unwrap();
        init_node(InitArgs {
            dirs: dirs(dir.path()),
            validator_key: Some(hex::encode([4u8; 32])),
            genesis_timestamp: Some(10),
        })
        .unwrap();
        assert!(dir.path().join(KEY_FILE).exists());
        assert!(dir.path().join(CONFIG_FILE).exists());

        produce_blocks(ProduceArgs {
            dirs: dirs(dir.path()),
            blocks: 2,
            transactions: None,
        })
        .unwrap();

        let node = Node::open(&dirs(dir.path())).unwrap();
        let head = node.load_block(&node.head().unwrap()).unwrap();
        assert_eq!(head.number, Some(2));
        assert_eq!(head.timestamp, Some(12));
        assert!(validate_block(&head, &node.store).is_ok());
    }

    #[test]
    fn init_refuses_existing_chain() {
        let dir = tempfile::tempdir().unwrap();
        let args = || InitArgs {
            dirs: dirs(dir.path()),
            validator_key: None,
            genesis_timestamp: None,
        };
        init_node(args()).unwrap();
        assert!(init_node(args()).is_err());
    }

    #[test]
    fn parse_hash_checks_length() {
        assert!(parse_hash(&hex::encode([1u8; 32])).is_ok());
        assert!(parse_hash("abcd").is_err());
        assert!(parse_hash("zz").is_err());
    }

    #[test]
    fn block_view_hex_encodes() {
        let mut block = Block {
            number: Some(3),
            delay_output: vec![0xab],
            ..Block::default()
        };
        block.seal();
        let view = BlockView::from(&block);
        assert_eq!(view.delay_output, "ab");
        assert_eq!(view.hash, hex::encode(block.hash));
        assert!(view.signature.is_none());
    }
}
