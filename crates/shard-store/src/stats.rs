use serde::{Deserialize, Serialize};

/// Point-in-time summary of a store's contents.
///
/// Derived from a full listing on every call; never cached or persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    /// Number of shards currently stored.
    pub total_shards: u64,
    /// Sum of all shard sizes in bytes.
    pub total_size: u64,
    /// Mean shard size in bytes, rounded to the nearest integer. Zero when empty.
    pub average_size: u64,
}

impl StorageStats {
    /// Aggregate a set of shard sizes.
    pub fn from_sizes<I>(sizes: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        let (total_shards, total_size) = sizes
            .into_iter()
            .fold((0u64, 0u64), |(count, total), size| {
                (count + 1, total.saturating_add(size))
            });
        Self {
            total_shards,
            total_size,
            average_size: rounded_average(total_size, total_shards),
        }
    }
}

fn rounded_average(total: u64, count: u64) -> u64 {
    if count == 0 {
        return 0;
    }
    // Round half up without overflowing near u64::MAX.
    let quotient = total / count;
    let remainder = total % count;
    if remainder >= count - remainder {
        quotient + 1
    } else {
        quotient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_all_zero() {
        assert_eq!(StorageStats::from_sizes([]), StorageStats::default());
    }

    #[test]
    fn equal_sizes() {
        let stats = StorageStats::from_sizes([5, 5, 5]);
        assert_eq!(
            stats,
            StorageStats {
                total_shards: 3,
                total_size: 15,
                average_size: 5,
            }
        );
    }

    #[test]
    fn average_rounds_half_up() {
        assert_eq!(StorageStats::from_sizes([1, 2]).average_size, 2);
        assert_eq!(StorageStats::from_sizes([1, 1, 2]).average_size, 1);
        assert_eq!(StorageStats::from_sizes([1, 2, 2]).average_size, 2);
        assert_eq!(StorageStats::from_sizes([0]).average_size, 0);
    }

    #[test]
    fn serializes_with_snake_case_fields() {
        let json = serde_json::to_value(StorageStats::from_sizes([4, 6])).unwrap();
        assert_eq!(json["total_shards"], 2);
        assert_eq!(json["total_size"], 10);
        assert_eq!(json["average_size"], 5);
    }
}
