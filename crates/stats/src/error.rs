//! Cache error types.

use thiserror::Error;

/// Errors from a cache backend or the snapshot codec.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend could not serve the request.
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    /// A Redis command failed.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Cached bytes were not a well-formed snapshot.
    #[error("Malformed cache entry: {0}")]
    Codec(#[from] serde_json::Error),

    /// Cached snapshot was written by an incompatible version.
    #[error("Unsupported snapshot version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Cached snapshot decoded but its figures are inconsistent.
    #[error("Invalid cached snapshot: {0}")]
    Invalid(String),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
