//! # CLI Interface
//!
//! Defines the command-line argument structure for `atomchain-node` using
//! `clap` derive. Subcommands: `init`, `produce`, `inspect`, `validate`
//! and `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Atomchain validator node.
///
/// Keeps a local chain in a sled database, produces and signs blocks with
/// the validator key, and inspects or re-validates stored blocks.
#[derive(Parser, Debug)]
#[command(
    name = "atomchain-node",
    about = "Atomchain validator node",
    version,
    propagate_version = true
)]
pub struct NodeCli {
    /// Log output format.
    #[arg(long, global = true, value_enum, env = "ATOMCHAIN_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    /// Default log filter when `RUST_LOG` is not set.
    #[arg(long, global = true, default_value = "atomchain_node=info,atomchain_protocol=info")]
    pub log_level: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory, the validator key and the genesis block.
    Init(InitArgs),
    /// Produce, sign and store blocks on top of the current head.
    Produce(ProduceArgs),
    /// Print a stored block as JSON.
    Inspect(BlockArgs),
    /// Re-run block validation on a stored block.
    Validate(BlockArgs),
    /// Print version information and exit.
    Version,
}

/// Where the node keeps its state.
#[derive(Args, Debug, Clone)]
pub struct NodeDirArgs {
    /// Data directory holding the database, key file and config.
    #[arg(long, short = 'd', env = "ATOMCHAIN_DATA_DIR", default_value = ".atomchain")]
    pub data_dir: PathBuf,

    /// Chain config file (JSON). Defaults to `config.json` in the data
    /// directory, then to built-in defaults.
    #[arg(long, short = 'c', env = "ATOMCHAIN_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Arguments for the `init` subcommand.
#[derive(Args, Debug)]
pub struct InitArgs {
    #[command(flatten)]
    pub dirs: NodeDirArgs,

    /// Hex-encoded Ed25519 secret key to use instead of generating one.
    ///
    /// **Never pass this flag in production.** It ends up in shell history.
    #[arg(long, env = "ATOMCHAIN_VALIDATOR_KEY")]
    pub validator_key: Option<String>,

    /// Timestamp for the genesis block. Overrides the config file.
    #[arg(long)]
    pub genesis_timestamp: Option<u64>,
}

/// Arguments for the `produce` subcommand.
#[derive(Args, Debug)]
pub struct ProduceArgs {
    #[command(flatten)]
    pub dirs: NodeDirArgs,

    /// Number of blocks to produce.
    #[arg(long, short = 'n', default_value_t = 1)]
    pub blocks: u64,

    /// JSON file with an array of transactions, applied in order.
    #[arg(long, short = 't')]
    pub transactions: Option<PathBuf>,
}

/// Arguments for `inspect` and `validate`.
#[derive(Args, Debug)]
pub struct BlockArgs {
    #[command(flatten)]
    pub dirs: NodeDirArgs,

    /// Hex block id. Defaults to the chain head.
    pub block: Option<String>,
}
