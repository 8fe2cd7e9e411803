use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{StoreError, StoreResult};
use crate::stats::StorageStats;

/// Hash-keyed shard storage backend.
///
/// All implementations must satisfy these invariants:
/// - `put` followed by `get` on the same hash returns the exact bytes stored.
/// - One shard per hash: a later `put` replaces the earlier one.
/// - `get` on an absent hash fails with [`StoreError::NotFound`], never a
///   generic error.
/// - `delete` is idempotent: removing an absent shard succeeds.
/// - `list` makes no ordering promise.
/// - The store never checks that a hash is a digest of its data; that is the
///   caller's responsibility.
#[async_trait]
pub trait ShardStore: Send + Sync {
    /// Store `data` under `hash`, replacing any existing shard. Returns the hash.
    async fn put(&self, hash: &str, data: Bytes) -> StoreResult<String>;

    /// Return the bytes stored under `hash`.
    async fn get(&self, hash: &str) -> StoreResult<Bytes>;

    /// Remove the shard stored under `hash`, if any.
    async fn delete(&self, hash: &str) -> StoreResult<()>;

    /// Hashes of every stored shard, in no particular order.
    async fn list(&self) -> StoreResult<Vec<String>>;

    /// Largest payload `put` accepts, in bytes.
    ///
    /// Callers can check this before buffering a payload. Defaults to no limit.
    fn max_shard_size(&self) -> u64 {
        u64::MAX
    }

    /// Check whether a shard exists.
    ///
    /// Default implementation reads the shard. Backends may override with a
    /// cheaper lookup.
    async fn contains(&self, hash: &str) -> StoreResult<bool> {
        match self.get(hash).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Size in bytes of the shard stored under `hash`.
    ///
    /// Default implementation reads the shard. Backends may override with a
    /// metadata lookup.
    async fn shard_size(&self, hash: &str) -> StoreResult<u64> {
        Ok(self.get(hash).await?.len() as u64)
    }

    /// Aggregate statistics over every listed shard.
    ///
    /// Default implementation sizes shards one at a time. Shards that vanish
    /// between `list` and the size lookup are skipped; any other failure
    /// aborts the aggregation.
    async fn stats(&self) -> StoreResult<StorageStats> {
        let mut sizes = Vec::new();
        for hash in self.list().await? {
            match self.shard_size(&hash).await {
                Ok(size) => sizes.push(size),
                Err(StoreError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(StorageStats::from_sizes(sizes))
    }
}
