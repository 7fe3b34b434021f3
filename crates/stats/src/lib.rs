//! Per-owner order statistics.
//!
//! This crate provides the cache-aside view over the order store:
//! - [`StatsSnapshot`] and its versioned, schema-checked cache encoding
//! - [`CacheBackend`] trait with in-memory and Redis implementations
//! - [`StatsCache`], which serves snapshots from the cache and recomputes
//!   them from the store on a miss
//!
//! The store stays authoritative. Cache failures are logged and never
//! surface to callers; store failures do.

pub mod backend;
pub mod cache;
pub mod error;
pub mod memory;
pub mod redis_cache;
pub mod snapshot;

pub use backend::CacheBackend;
pub use cache::{DEFAULT_STATS_TTL, StatsCache, stats_key};
pub use error::{CacheError, Result};
pub use memory::InMemoryCache;
pub use redis_cache::RedisCache;
pub use snapshot::{SNAPSHOT_VERSION, StatsSnapshot};
