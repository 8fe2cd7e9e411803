use crate::error::{StoreError, StoreResult};

/// Longest shard name accepted; matches the common filesystem name limit.
pub const MAX_HASH_LEN: usize = 255;

/// Prefix of names reserved for the store's own bookkeeping entries.
const RESERVED_PREFIX: char = '.';

/// Validate a caller-supplied shard hash.
///
/// The store does not check that `hash` is a digest of anything. It only
/// rejects names that cannot safely become a single path component under
/// the storage root. No I/O is performed.
///
/// # Examples
///
/// ```
/// use shard_store::validate_hash;
///
/// assert!(validate_hash("9f86d081884c7d65").is_ok());
/// assert!(validate_hash("").is_err());
/// assert!(validate_hash("../etc/passwd").is_err());
/// ```
pub fn validate_hash(hash: &str) -> StoreResult<()> {
    let reason = if hash.is_empty() {
        "hash must not be empty"
    } else if hash.len() > MAX_HASH_LEN {
        "hash is longer than 255 bytes"
    } else if hash.contains(['/', '\\']) {
        "hash must not contain path separators"
    } else if hash.contains('\0') {
        "hash must not contain NUL"
    } else if is_reserved_name(hash) {
        "hash must not start with '.'"
    } else {
        return Ok(());
    };

    Err(StoreError::InvalidHash {
        hash: hash.to_owned(),
        reason,
    })
}

/// Whether a directory entry name belongs to the store rather than a shard.
pub fn is_reserved_name(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

/// Lowercase hex BLAKE3 digest of `data`.
///
/// Convenience for callers that want a content address for a payload.
pub fn content_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason_for(hash: &str) -> &'static str {
        match validate_hash(hash) {
            Err(StoreError::InvalidHash { reason, .. }) => reason,
            other => panic!("expected InvalidHash for {hash:?}, got {other:?}"),
        }
    }

    #[test]
    fn accepts_hex_digests() {
        validate_hash("h1").unwrap();
        validate_hash("testhash123").unwrap();
        validate_hash(&content_hash(b"abc")).unwrap();
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(reason_for(""), "hash must not be empty");
    }

    #[test]
    fn rejects_path_traversal() {
        assert_eq!(reason_for("../etc/passwd"), "hash must not contain path separators");
        assert_eq!(reason_for("a\\b"), "hash must not contain path separators");
        assert_eq!(reason_for(".."), "hash must not start with '.'");
        assert_eq!(reason_for("."), "hash must not start with '.'");
    }

    #[test]
    fn rejects_nul_and_overlong() {
        assert_eq!(reason_for("ab\0cd"), "hash must not contain NUL");
        assert_eq!(reason_for(&"a".repeat(MAX_HASH_LEN + 1)), "hash is longer than 255 bytes");
        validate_hash(&"a".repeat(MAX_HASH_LEN)).unwrap();
    }

    #[test]
    fn reserved_names() {
        assert!(is_reserved_name(".tmp-abc"));
        assert!(!is_reserved_name("abc"));
    }

    #[test]
    fn content_hash_is_blake3_hex() {
        let h = content_hash(b"test data");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(h, content_hash(b"test data"));
        assert_ne!(h, content_hash(b"other data"));
    }
}
