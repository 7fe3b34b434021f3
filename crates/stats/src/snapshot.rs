//! Stats snapshot and its cache encoding.
//!
//! Cached entries are plain JSON documents with a version tag and a closed
//! set of fields. Anything else (unknown fields, a different version,
//! inconsistent counts) fails to decode and is treated as a cache miss.

use domain::Money;
use order_store::OwnerTotals;
use serde::{Deserialize, Serialize};

use crate::{CacheError, Result};

/// Current encoding version of cached snapshots.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Derived per-owner order statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub order_count: u64,
    pub total_spent: Money,
    pub pending_count: u64,
    pub completed_count: u64,
}

impl From<OwnerTotals> for StatsSnapshot {
    fn from(totals: OwnerTotals) -> Self {
        Self {
            order_count: totals.order_count,
            total_spent: totals.total_spent,
            pending_count: totals.pending_count,
            completed_count: totals.completed_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CachedSnapshot {
    version: u32,
    order_count: u64,
    total_spent_cents: i64,
    pending_count: u64,
    completed_count: u64,
}

impl StatsSnapshot {
    /// Encodes the snapshot for storage in a cache backend.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let cached = CachedSnapshot {
            version: SNAPSHOT_VERSION,
            order_count: self.order_count,
            total_spent_cents: self.total_spent.cents(),
            pending_count: self.pending_count,
            completed_count: self.completed_count,
        };
        Ok(serde_json::to_vec(&cached)?)
    }

    /// Decodes a cached snapshot, rejecting anything not produced by
    /// [`StatsSnapshot::encode`] of the current version.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let cached: CachedSnapshot = serde_json::from_slice(bytes)?;

        if cached.version != SNAPSHOT_VERSION {
            return Err(CacheError::UnsupportedVersion {
                found: cached.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        if cached.total_spent_cents < 0 {
            return Err(CacheError::Invalid(format!(
                "negative total_spent_cents {}",
                cached.total_spent_cents
            )));
        }
        if cached.pending_count.saturating_add(cached.completed_count) > cached.order_count {
            return Err(CacheError::Invalid(format!(
                "pending {} + completed {} exceeds order_count {}",
                cached.pending_count, cached.completed_count, cached.order_count
            )));
        }

        Ok(Self {
            order_count: cached.order_count,
            total_spent: Money::from_cents(cached.total_spent_cents),
            pending_count: cached.pending_count,
            completed_count: cached.completed_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> StatsSnapshot {
        StatsSnapshot {
            order_count: 3,
            total_spent: Money::from_cents(12_345),
            pending_count: 1,
            completed_count: 1,
        }
    }

    #[test]
    fn test_encode_decode() {
        let bytes = snapshot().encode().unwrap();
        assert_eq!(StatsSnapshot::decode(&bytes).unwrap(), snapshot());
    }

    #[test]
    fn test_encoding_is_plain_json() {
        let bytes = snapshot().encode().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["total_spent_cents"], 12_345);
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let bytes = br#"{"version":1,"order_count":1,"total_spent_cents":100,
            "pending_count":1,"completed_count":0,"__proto__":"x"}"#;
        assert!(matches!(
            StatsSnapshot::decode(bytes),
            Err(CacheError::Codec(_))
        ));
    }

    #[test]
    fn test_rejects_expressions_and_garbage() {
        for bytes in [
            &b"{'order_count': 1}"[..],
            b"__import__('os').system('true')",
            b"",
            b"null",
            b"[1,2,3]",
        ] {
            assert!(StatsSnapshot::decode(bytes).is_err());
        }
    }

    #[test]
    fn test_rejects_other_versions() {
        let bytes = br#"{"version":2,"order_count":0,"total_spent_cents":0,
            "pending_count":0,"completed_count":0}"#;
        assert!(matches!(
            StatsSnapshot::decode(bytes),
            Err(CacheError::UnsupportedVersion { found: 2, expected: 1 })
        ));
    }

    #[test]
    fn test_rejects_inconsistent_counts() {
        let bytes = br#"{"version":1,"order_count":1,"total_spent_cents":0,
            "pending_count":1,"completed_count":1}"#;
        assert!(matches!(
            StatsSnapshot::decode(bytes),
            Err(CacheError::Invalid(_))
        ));

        let bytes = br#"{"version":1,"order_count":1,"total_spent_cents":-5,
            "pending_count":0,"completed_count":0}"#;
        assert!(matches!(
            StatsSnapshot::decode(bytes),
            Err(CacheError::Invalid(_))
        ));
    }

    #[test]
    fn test_from_owner_totals() {
        let totals = OwnerTotals {
            order_count: 2,
            total_spent: Money::from_cents(500),
            pending_count: 2,
            completed_count: 0,
        };
        let snapshot = StatsSnapshot::from(totals);
        assert_eq!(snapshot.order_count, 2);
        assert_eq!(snapshot.total_spent.cents(), 500);
    }
}
