use anyhow::{bail, Context};
use bytes::Bytes;
use colored::Colorize;
use serde_json::json;
use shard_store::{content_hash, FileSystemStore, ShardStore, StoreConfig, StoreError};

use crate::cli::*;

/// What a command produced for stdout.
#[derive(Debug)]
pub enum Output {
    Text(String),
    /// Shard bytes, written to stdout unmodified.
    Raw(Bytes),
}

pub async fn run_command(cli: Cli) -> anyhow::Result<Output> {
    let config = resolve_config(&cli)?;
    let store = FileSystemStore::with_config(config)?;
    execute(&store, cli.command, cli.format).await
}

/// Merge the config file (if any) with command-line overrides.
pub fn resolve_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    let mut config = match (&cli.config, &cli.root) {
        (Some(path), _) => StoreConfig::load(path)?,
        (None, Some(root)) => StoreConfig::new(root),
        (None, None) => bail!("no storage root: pass --root or --config"),
    };
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    config.validate()?;
    Ok(config)
}

pub async fn execute(
    store: &dyn ShardStore,
    command: Command,
    format: OutputFormat,
) -> anyhow::Result<Output> {
    match command {
        Command::Put(args) => cmd_put(store, args, format).await,
        Command::Get(args) => cmd_get(store, args, format).await,
        Command::Delete(args) => cmd_delete(store, args, format).await,
        Command::List => cmd_list(store, format).await,
        Command::Stats => cmd_stats(store, format).await,
    }
}

async fn cmd_put(store: &dyn ShardStore, args: PutArgs, format: OutputFormat) -> anyhow::Result<Output> {
    let size = tokio::fs::metadata(&args.file)
        .await
        .with_context(|| format!("cannot read {}", args.file.display()))?
        .len();
    let limit = store.max_shard_size();
    if size > limit {
        return Err(StoreError::ShardTooLarge { size, limit }.into());
    }

    let data = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("cannot read {}", args.file.display()))?;
    let hash = args.hash.unwrap_or_else(|| content_hash(&data));
    let hash = store.put(&hash, Bytes::from(data)).await?;

    Ok(Output::Text(match format {
        OutputFormat::Json => json!({ "hash": hash, "bytes": size }).to_string(),
        OutputFormat::Text => format!("{} Stored {} ({} bytes)", "✓".green().bold(), hash.yellow(), size),
    }))
}

async fn cmd_get(store: &dyn ShardStore, args: GetArgs, format: OutputFormat) -> anyhow::Result<Output> {
    let data = store.get(&args.hash).await?;
    let Some(path) = args.output else {
        return Ok(Output::Raw(data));
    };

    tokio::fs::write(&path, &data)
        .await
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(Output::Text(match format {
        OutputFormat::Json => json!({
            "hash": args.hash,
            "bytes": data.len(),
            "output": path.display().to_string(),
        })
        .to_string(),
        OutputFormat::Text => format!(
            "{} Wrote {} bytes of {} to {}",
            "✓".green().bold(),
            data.len(),
            args.hash.yellow(),
            path.display()
        ),
    }))
}

async fn cmd_delete(store: &dyn ShardStore, args: DeleteArgs, format: OutputFormat) -> anyhow::Result<Output> {
    store.delete(&args.hash).await?;
    Ok(Output::Text(match format {
        OutputFormat::Json => json!({ "hash": args.hash, "deleted": true }).to_string(),
        OutputFormat::Text => format!("{} Deleted {}", "✓".green().bold(), args.hash.yellow()),
    }))
}

async fn cmd_list(store: &dyn ShardStore, format: OutputFormat) -> anyhow::Result<Output> {
    let mut hashes = store.list().await?;
    hashes.sort();
    Ok(Output::Text(match format {
        OutputFormat::Json => json!(hashes).to_string(),
        OutputFormat::Text if hashes.is_empty() => "No shards stored.".to_string(),
        OutputFormat::Text => hashes.join("\n"),
    }))
}

async fn cmd_stats(store: &dyn ShardStore, format: OutputFormat) -> anyhow::Result<Output> {
    let stats = store.stats().await?;
    Ok(Output::Text(match format {
        OutputFormat::Json => serde_json::to_string(&stats)?,
        OutputFormat::Text => format!(
            "Shards:       {}\nTotal size:   {} bytes\nAverage size: {} bytes",
            stats.total_shards.to_string().bold(),
            stats.total_size,
            stats.average_size
        ),
    }))
}
