//! Cache-aside stats layer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::OwnerId;
use order_store::OrderStore;
use tokio::sync::Mutex;

use crate::{CacheBackend, StatsSnapshot};

/// How long a computed snapshot stays cached unless invalidated first.
pub const DEFAULT_STATS_TTL: Duration = Duration::from_secs(300);

/// Cache key holding an owner's snapshot.
pub fn stats_key(owner: OwnerId) -> String {
    format!("stats:{owner}")
}

/// Serves per-owner stats from a cache, recomputing from the store on a
/// miss.
///
/// Every cache interaction is best-effort: a failing backend is logged and
/// counted, and the snapshot is computed from the store instead. Store
/// failures are returned to the caller.
///
/// While an owner's snapshot is being recomputed, the owner has an
/// invalidation generation. A recompute only writes its result back if no
/// invalidation happened while it was reading the store, so an invalidation
/// cannot be undone by a slower concurrent read. The entry is dropped when
/// the last recompute for that owner finishes, so tracking is bounded by the
/// number of owners with a recompute in flight.
pub struct StatsCache<S> {
    store: Arc<S>,
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
    recomputes: Mutex<HashMap<OwnerId, Recompute>>,
}

#[derive(Debug, Default)]
struct Recompute {
    generation: u64,
    in_flight: usize,
}

impl<S: OrderStore> StatsCache<S> {
    pub fn new(store: Arc<S>, backend: Arc<dyn CacheBackend>) -> Self {
        Self::with_ttl(store, backend, DEFAULT_STATS_TTL)
    }

    pub fn with_ttl(store: Arc<S>, backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self {
            store,
            backend,
            ttl,
            recomputes: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the owner's stats, from the cache when fresh.
    #[tracing::instrument(skip(self))]
    pub async fn get_stats(&self, owner: OwnerId) -> order_store::Result<StatsSnapshot> {
        let key = stats_key(owner);

        if let Some(snapshot) = self.read_cached(&key).await {
            metrics::counter!("stats_cache_hits_total").increment(1);
            return Ok(snapshot);
        }
        metrics::counter!("stats_cache_misses_total").increment(1);

        let generation = self.begin_recompute(owner).await;
        let result = self
            .store
            .owner_totals(owner)
            .await
            .map(StatsSnapshot::from);
        if let Ok(snapshot) = &result {
            self.write_back(owner, &key, generation, snapshot).await;
        }
        self.end_recompute(owner).await;

        result
    }

    /// Evicts the owner's cached stats.
    ///
    /// Must be called after every write that changes the owner's figures.
    /// Never fails; a backend error is logged and the entry expires on its
    /// own within the TTL.
    #[tracing::instrument(skip(self))]
    pub async fn invalidate(&self, owner: OwnerId) {
        // Only a recompute in flight can write back a stale snapshot.
        if let Some(recompute) = self.recomputes.lock().await.get_mut(&owner) {
            recompute.generation += 1;
        }
        metrics::counter!("stats_cache_invalidations_total").increment(1);

        if let Err(err) = self.backend.delete(&stats_key(owner)).await {
            tracing::warn!(error = %err, "failed to evict cached stats");
            metrics::counter!("stats_cache_errors_total", "op" => "delete").increment(1);
        }
    }

    async fn begin_recompute(&self, owner: OwnerId) -> u64 {
        let mut recomputes = self.recomputes.lock().await;
        let recompute = recomputes.entry(owner).or_default();
        recompute.in_flight += 1;
        recompute.generation
    }

    async fn end_recompute(&self, owner: OwnerId) {
        let mut recomputes = self.recomputes.lock().await;
        if let Some(recompute) = recomputes.get_mut(&owner) {
            recompute.in_flight = recompute.in_flight.saturating_sub(1);
            if recompute.in_flight == 0 {
                recomputes.remove(&owner);
            }
        }
    }

    async fn generation(&self, owner: OwnerId) -> Option<u64> {
        self.recomputes
            .lock()
            .await
            .get(&owner)
            .map(|recompute| recompute.generation)
    }

    async fn read_cached(&self, key: &str) -> Option<StatsSnapshot> {
        let bytes = match self.backend.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read cached stats");
                metrics::counter!("stats_cache_errors_total", "op" => "get").increment(1);
                return None;
            }
        };

        match StatsSnapshot::decode(&bytes) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!(error = %err, "discarding undecodable cached stats");
                metrics::counter!("stats_cache_errors_total", "op" => "decode").increment(1);
                if let Err(err) = self.backend.delete(key).await {
                    tracing::warn!(error = %err, "failed to evict undecodable cached stats");
                }
                None
            }
        }
    }

    async fn write_back(&self, owner: OwnerId, key: &str, generation: u64, snapshot: &StatsSnapshot) {
        if self.generation(owner).await != Some(generation) {
            tracing::debug!("stats invalidated during recompute, not caching");
            return;
        }

        let bytes = match snapshot.encode() {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode stats snapshot");
                return;
            }
        };
        if let Err(err) = self.backend.set(key, bytes, self.ttl).await {
            tracing::warn!(error = %err, "failed to cache stats");
            metrics::counter!("stats_cache_errors_total", "op" => "set").increment(1);
            return;
        }

        // An invalidation may have slipped in between the check and the set.
        if self.generation(owner).await != Some(generation)
            && let Err(err) = self.backend.delete(key).await
        {
            tracing::warn!(error = %err, "failed to evict stale cached stats");
            metrics::counter!("stats_cache_errors_total", "op" => "delete").increment(1);
        }
    }
}
