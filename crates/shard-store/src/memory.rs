use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::DEFAULT_MAX_SHARD_SIZE;
use crate::error::{StoreError, StoreResult};
use crate::hash::validate_hash;
use crate::stats::StorageStats;
use crate::traits::ShardStore;

/// In-memory, HashMap-based shard store.
///
/// Intended for tests and embedding. Applies the same hash validation and
/// size limit as [`FileSystemStore`](crate::FileSystemStore), so callers can
/// swap one for the other. Payloads are reference-counted [`Bytes`], so reads
/// do not copy.
pub struct InMemoryShardStore {
    shards: RwLock<HashMap<String, Bytes>>,
    max_shard_size: u64,
}

impl InMemoryShardStore {
    /// Create a new empty store with the default 500 MiB limit.
    pub fn new() -> Self {
        Self::with_max_shard_size(DEFAULT_MAX_SHARD_SIZE)
    }

    /// Create a new empty store with a custom size limit.
    pub fn with_max_shard_size(max_shard_size: u64) -> Self {
        Self {
            shards: RwLock::new(HashMap::new()),
            max_shard_size,
        }
    }

    /// Number of shards currently stored.
    pub fn len(&self) -> usize {
        self.shards.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.shards.read().expect("lock poisoned").is_empty()
    }

    /// Remove all shards from the store.
    pub fn clear(&self) {
        self.shards.write().expect("lock poisoned").clear();
    }
}

impl Default for InMemoryShardStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShardStore for InMemoryShardStore {
    async fn put(&self, hash: &str, data: Bytes) -> StoreResult<String> {
        validate_hash(hash)?;
        let size = data.len() as u64;
        if size > self.max_shard_size {
            return Err(StoreError::ShardTooLarge {
                size,
                limit: self.max_shard_size,
            });
        }
        let mut map = self.shards.write().expect("lock poisoned");
        map.insert(hash.to_owned(), data);
        Ok(hash.to_owned())
    }

    async fn get(&self, hash: &str) -> StoreResult<Bytes> {
        validate_hash(hash)?;
        let map = self.shards.read().expect("lock poisoned");
        map.get(hash)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(hash.to_owned()))
    }

    async fn delete(&self, hash: &str) -> StoreResult<()> {
        validate_hash(hash)?;
        self.shards.write().expect("lock poisoned").remove(hash);
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<String>> {
        let map = self.shards.read().expect("lock poisoned");
        Ok(map.keys().cloned().collect())
    }

    fn max_shard_size(&self) -> u64 {
        self.max_shard_size
    }

    async fn contains(&self, hash: &str) -> StoreResult<bool> {
        validate_hash(hash)?;
        Ok(self.shards.read().expect("lock poisoned").contains_key(hash))
    }

    async fn stats(&self) -> StoreResult<StorageStats> {
        let map = self.shards.read().expect("lock poisoned");
        Ok(StorageStats::from_sizes(map.values().map(|data| data.len() as u64)))
    }
}

impl std::fmt::Debug for InMemoryShardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryShardStore")
            .field("shard_count", &count)
            .field("max_shard_size", &self.max_shard_size)
            .finish()
    }
}
