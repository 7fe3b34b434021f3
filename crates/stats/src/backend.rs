use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// Byte-oriented key/value storage with per-entry expiry.
///
/// Values are opaque to the backend; interpreting them is the caller's job.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Returns the value stored under `key`, or None if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}
