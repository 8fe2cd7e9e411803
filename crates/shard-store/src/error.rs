use std::path::PathBuf;

/// Errors from shard store operations.
///
/// Every variant maps to a stable, machine-readable code (see
/// [`StoreError::code`]). Callers should branch on the variant or the code,
/// never on the rendered message.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No shard is stored under the requested hash.
    #[error("shard not found: {0}")]
    NotFound(String),

    /// The hash is empty or cannot be used as a shard name.
    #[error("invalid hash {hash:?}: {reason}")]
    InvalidHash { hash: String, reason: &'static str },

    /// The payload is larger than the configured maximum shard size.
    #[error("shard size exceeds the limit: {size} bytes > {limit} bytes")]
    ShardTooLarge { size: u64, limit: u64 },

    /// The storage root could not be created or opened.
    #[error("storage root {path:?} is unavailable: {source}")]
    StorageRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Removing an existing shard failed.
    #[error("failed to delete shard {hash}: {source}")]
    DeleteFailed {
        hash: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error from the underlying storage backend, passed through as-is.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Invalid store configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "SHARD_NOT_FOUND",
            Self::InvalidHash { .. } => "INVALID_HASH",
            Self::ShardTooLarge { .. } => "SHARD_TOO_LARGE",
            Self::StorageRoot { .. } => "STORAGE_ROOT_UNAVAILABLE",
            Self::DeleteFailed { .. } => "DELETE_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Config(_) => "INVALID_CONFIG",
        }
    }

    /// Returns `true` for the expected-absence case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns `true` when the caller's input was rejected before any I/O.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidHash { .. } | Self::ShardTooLarge { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
