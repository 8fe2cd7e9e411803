use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use shard_store::LogLevel;

#[derive(Parser)]
#[command(
    name = "shardstore",
    about = "Content-addressed shard storage",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Storage root directory (overrides the config file)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// TOML store configuration
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log verbosity: debug, info, warn or error
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a file as a shard
    Put(PutArgs),
    /// Fetch a shard
    Get(GetArgs),
    /// Delete a shard
    Delete(DeleteArgs),
    /// List stored shard hashes
    List,
    /// Show shard count and sizes
    Stats,
}

#[derive(Args)]
pub struct PutArgs {
    pub file: PathBuf,
    /// Hash to store under; defaults to the BLAKE3 digest of the file
    #[arg(long)]
    pub hash: Option<String>,
}

#[derive(Args)]
pub struct GetArgs {
    pub hash: String,
    /// Write the shard here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct DeleteArgs {
    pub hash: String,
}
