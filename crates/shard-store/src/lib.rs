//! Content-addressed shard storage.
//!
//! Callers store and retrieve opaque binary shards keyed by a hash string
//! through the backend-agnostic [`ShardStore`] trait. Replication, erasure
//! coding and routing live above this crate and talk to storage only through
//! that trait.
//!
//! # Storage Backends
//!
//! - [`FileSystemStore`] -- one file per shard in a flat directory
//! - [`InMemoryShardStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Errors
//!
//! Every operation returns [`StoreResult`]. A missing shard is the distinct
//! [`StoreError::NotFound`] variant (code `SHARD_NOT_FOUND`) so callers can
//! fall back to another source without string matching. Invalid input fails
//! before any I/O; I/O faults are logged and passed through unchanged.
//!
//! # Design Rules
//!
//! 1. One shard per hash; the last `put` wins.
//! 2. `delete` is idempotent.
//! 3. The store never checks that a hash matches its data.
//! 4. Loggers are injected per store, never taken from global state.
//! 5. Statistics are recomputed from a full listing on every call.

pub mod config;
pub mod error;
pub mod fs;
pub mod hash;
pub mod logging;
pub mod memory;
pub mod stats;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::{StoreConfig, DEFAULT_MAX_SHARD_SIZE};
pub use error::{StoreError, StoreResult};
pub use fs::{FileSystemStore, STALE_TEMP_AGE};
pub use hash::{content_hash, validate_hash};
pub use logging::{LogLevel, StorageLogger};
pub use memory::InMemoryShardStore;
pub use stats::StorageStats;
pub use traits::ShardStore;

pub use bytes::Bytes;
