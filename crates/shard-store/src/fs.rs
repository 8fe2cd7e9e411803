use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::hash::{is_reserved_name, validate_hash};
use crate::logging::StorageLogger;
use crate::stats::StorageStats;
use crate::traits::ShardStore;

/// Upper bound on metadata lookups in flight during [`FileSystemStore::stats`].
const MAX_CONCURRENT_STATS: usize = 64;

/// Name prefix of in-flight writes.
const TEMP_PREFIX: &str = ".tmp-";

/// Temporary files older than this are swept by `list`.
pub const STALE_TEMP_AGE: Duration = Duration::from_secs(60 * 60);

/// Shard store backed by a flat directory.
///
/// On-disk layout:
/// ```text
/// <root>/<hash>          one regular file per shard, contents = shard bytes
/// <root>/.tmp-<uuid>     in-flight write, fsynced then renamed over <root>/<hash>
/// ```
///
/// The root is created on first write or listing. Names starting with `.`
/// are reserved for the store and never reported as shards. Temporary files
/// left behind by crashed writes are removed by `list` once they are older
/// than [`STALE_TEMP_AGE`], or on demand with
/// [`FileSystemStore::cleanup_temp_files`]. Only regular files count as
/// shards. Multiple stores pointed at the same root are not coordinated;
/// concurrent writers to the same hash race with last-rename-wins.
#[derive(Debug)]
pub struct FileSystemStore {
    root: PathBuf,
    max_shard_size: u64,
    logger: StorageLogger,
}

/// Entries of the storage root, split by role.
#[derive(Debug, Default)]
struct RootEntries {
    shards: Vec<String>,
    stale_temps: Vec<String>,
}

impl FileSystemStore {
    /// Open a store at `root` with default settings, logging to stderr at info.
    pub fn new(root: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::with_config(StoreConfig::new(root))
    }

    /// Open a store from a full configuration, logging to stderr at the
    /// configured level.
    pub fn with_config(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self {
            logger: StorageLogger::console(config.log_level),
            root: config.root,
            max_shard_size: config.max_shard_size,
        })
    }

    /// Replace the logging sink.
    pub fn with_logger(mut self, logger: StorageLogger) -> Self {
        self.logger = logger;
        self
    }

    /// The storage root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding the shard for `hash`.
    pub fn shard_path(&self, hash: &str) -> StoreResult<PathBuf> {
        validate_hash(hash)?;
        Ok(self.root.join(hash))
    }

    /// Remove temporary files left by interrupted writes that are at least
    /// `max_age` old. Returns how many were removed.
    ///
    /// A temporary file younger than `max_age` may belong to a write still in
    /// progress; pass [`Duration::ZERO`] only when no writer is active.
    pub async fn cleanup_temp_files(&self, max_age: Duration) -> StoreResult<usize> {
        self.logger.scope(self.sweep_temp_files(max_age)).await
    }

    async fn sweep_temp_files(&self, max_age: Duration) -> StoreResult<usize> {
        if !fs::try_exists(&self.root).await? {
            return Ok(0);
        }
        let entries = self.read_entries(max_age).await.map_err(|e| {
            error!(root = %self.root.display(), error = %e, "failed to scan storage root");
            e
        })?;
        Ok(self.remove_temp_files(&entries.stale_temps).await)
    }

    async fn ensure_directory(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.root).await.map_err(|source| {
            error!(root = %self.root.display(), error = %source, "failed to create storage root");
            StoreError::StorageRoot {
                path: self.root.clone(),
                source,
            }
        })
    }

    /// Write `data` to a reserved temporary name, flush it to disk, then
    /// rename it onto `path`.
    async fn write_replace(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let temp = self.root.join(format!("{TEMP_PREFIX}{}", Uuid::now_v7().simple()));
        let result = async {
            let mut file = fs::File::create(&temp).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp, path).await?;
            self.sync_root().await
        }
        .await;
        if result.is_err() {
            let _ = fs::remove_file(&temp).await;
        }
        result
    }

    /// Persist the root's directory entries so a completed rename survives a crash.
    #[cfg(unix)]
    async fn sync_root(&self) -> io::Result<()> {
        fs::File::open(&self.root).await?.sync_all().await
    }

    #[cfg(not(unix))]
    async fn sync_root(&self) -> io::Result<()> {
        Ok(())
    }

    async fn read_entries(&self, max_temp_age: Duration) -> io::Result<RootEntries> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut found = RootEntries::default();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                warn!(entry = ?entry.file_name(), "skipping non-UTF-8 entry in storage root");
                continue;
            };
            if is_reserved_name(&name) {
                if temp_is_stale(&name, max_temp_age, SystemTime::now()) {
                    found.stale_temps.push(name);
                }
                continue;
            }
            if entry.file_type().await?.is_file() {
                found.shards.push(name);
            }
        }
        Ok(found)
    }

    async fn remove_temp_files(&self, names: &[String]) -> usize {
        let mut removed = 0;
        for name in names {
            match fs::remove_file(self.root.join(name)).await {
                Ok(()) => removed += 1,
                // Finished or swept concurrently.
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(entry = %name, error = %e, "failed to remove temporary file"),
            }
        }
        if removed > 0 {
            info!(removed, "removed stale temporary files");
        }
        removed
    }

    /// Size of the regular file holding `hash`, or `None` if there is none.
    async fn lookup_file(&self, hash: &str) -> StoreResult<Option<u64>> {
        match fs::metadata(self.root.join(hash)).await {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => {
                warn!(hash, "entry is not a regular file, treating as absent");
                Ok(None)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                error!(hash, error = %e, "failed to check shard");
                Err(e.into())
            }
        }
    }

    async fn store_shard(&self, hash: &str, data: Bytes) -> StoreResult<String> {
        validate_hash(hash)?;
        let size = data.len() as u64;
        if size > self.max_shard_size {
            return Err(StoreError::ShardTooLarge {
                size,
                limit: self.max_shard_size,
            });
        }

        self.ensure_directory().await?;
        let path = self.root.join(hash);
        if let Err(e) = self.write_replace(&path, &data).await {
            error!(hash, error = %e, "failed to store shard");
            return Err(e.into());
        }
        info!(hash, bytes = size, "stored shard");
        Ok(hash.to_owned())
    }

    async fn read_shard(&self, hash: &str) -> StoreResult<Bytes> {
        validate_hash(hash)?;
        if self.lookup_file(hash).await?.is_none() {
            warn!(hash, "shard not found");
            return Err(StoreError::NotFound(hash.to_owned()));
        }

        match fs::read(self.root.join(hash)).await {
            Ok(data) => {
                debug!(hash, bytes = data.len(), "read shard");
                Ok(Bytes::from(data))
            }
            // Deleted between the existence check and the read.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(hash, "shard not found");
                Err(StoreError::NotFound(hash.to_owned()))
            }
            Err(e) => {
                error!(hash, error = %e, "failed to read shard");
                Err(e.into())
            }
        }
    }

    async fn remove_shard(&self, hash: &str) -> StoreResult<()> {
        validate_hash(hash)?;
        match fs::remove_file(self.root.join(hash)).await {
            Ok(()) => {
                info!(hash, "deleted shard");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(hash, "shard already absent, nothing to delete");
                Ok(())
            }
            Err(source) => {
                error!(hash, error = %source, "failed to delete shard");
                Err(StoreError::DeleteFailed {
                    hash: hash.to_owned(),
                    source,
                })
            }
        }
    }

    async fn list_shards(&self) -> StoreResult<Vec<String>> {
        self.ensure_directory().await?;
        let entries = self.read_entries(STALE_TEMP_AGE).await.map_err(|e| {
            error!(root = %self.root.display(), error = %e, "failed to list shards");
            e
        })?;
        self.remove_temp_files(&entries.stale_temps).await;
        debug!(count = entries.shards.len(), "listed shards");
        Ok(entries.shards)
    }

    async fn check_shard(&self, hash: &str) -> StoreResult<bool> {
        validate_hash(hash)?;
        Ok(self.lookup_file(hash).await?.is_some())
    }

    async fn size_shard(&self, hash: &str) -> StoreResult<u64> {
        validate_hash(hash)?;
        self.lookup_file(hash)
            .await?
            .ok_or_else(|| StoreError::NotFound(hash.to_owned()))
    }

    /// Sizes every listed shard with concurrent metadata lookups.
    ///
    /// Shards deleted mid-scan are skipped. The first other lookup failure
    /// aborts the remaining lookups and is returned.
    async fn aggregate_stats(&self) -> StoreResult<StorageStats> {
        let mut pending = self.list_shards().await?.into_iter();
        let mut lookups = JoinSet::new();
        let mut sizes = Vec::new();

        loop {
            while lookups.len() < MAX_CONCURRENT_STATS {
                let Some(hash) = pending.next() else { break };
                let path = self.root.join(&hash);
                lookups.spawn(async move {
                    let size = fs::metadata(&path).await.map(|meta| meta.len());
                    (hash, size)
                });
            }
            let Some(joined) = lookups.join_next().await else {
                break;
            };
            let (hash, size) = joined.map_err(io::Error::from)?;
            record_size(&mut sizes, &hash, size)?;
        }

        let stats = StorageStats::from_sizes(sizes);
        info!(
            total_shards = stats.total_shards,
            total_size = stats.total_size,
            average_size = stats.average_size,
            "computed storage stats"
        );
        Ok(stats)
    }
}

/// Fold one metadata lookup into the running stats scan.
fn record_size(sizes: &mut Vec<u64>, hash: &str, size: io::Result<u64>) -> StoreResult<()> {
    match size {
        Ok(size) => sizes.push(size),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(hash, "shard vanished during stats scan, skipping");
        }
        Err(e) => {
            error!(hash, error = %e, "failed to read shard metadata");
            return Err(e.into());
        }
    }
    Ok(())
}

/// Whether a reserved entry is a temporary file at least `max_age` old.
///
/// Age comes from the UUIDv7 timestamp in the name. Temp-prefixed names that
/// carry no timestamp were not written by this store and count as stale.
fn temp_is_stale(name: &str, max_age: Duration, now: SystemTime) -> bool {
    let Some(id) = name.strip_prefix(TEMP_PREFIX) else {
        return false;
    };
    let Some(timestamp) = Uuid::parse_str(id).ok().and_then(|id| id.get_timestamp()) else {
        return true;
    };
    let (secs, nanos) = timestamp.to_unix();
    let created = UNIX_EPOCH + Duration::new(secs, nanos);
    now.duration_since(created).is_ok_and(|age| age >= max_age)
}

#[async_trait]
impl ShardStore for FileSystemStore {
    async fn put(&self, hash: &str, data: Bytes) -> StoreResult<String> {
        self.logger.scope(self.store_shard(hash, data)).await
    }

    async fn get(&self, hash: &str) -> StoreResult<Bytes> {
        self.logger.scope(self.read_shard(hash)).await
    }

    async fn delete(&self, hash: &str) -> StoreResult<()> {
        self.logger.scope(self.remove_shard(hash)).await
    }

    async fn list(&self) -> StoreResult<Vec<String>> {
        self.logger.scope(self.list_shards()).await
    }

    fn max_shard_size(&self) -> u64 {
        self.max_shard_size
    }

    async fn contains(&self, hash: &str) -> StoreResult<bool> {
        self.logger.scope(self.check_shard(hash)).await
    }

    async fn shard_size(&self, hash: &str) -> StoreResult<u64> {
        self.logger.scope(self.size_shard(hash)).await
    }

    async fn stats(&self) -> StoreResult<StorageStats> {
        self.logger.scope(self.aggregate_stats()).await
    }
}
