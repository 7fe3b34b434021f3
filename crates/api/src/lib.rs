//! HTTP API server for order placement.
//!
//! Provides the order endpoints under `/api/orders` behind bearer-token
//! identity, plus `/health` and a Prometheus `/metrics` endpoint, with
//! structured logging (tracing) on every request.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, put};
use catalog::CatalogClient;
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::OrderStore;
use placement::OrderService;
use stats::{CacheBackend, StatsCache};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use auth::{AuthUser, JwtVerifier};

/// Shared application state accessible from all handlers.
pub struct AppState<S, C> {
    pub orders: OrderService<S, C>,
    pub auth: JwtVerifier,
}

impl<S, C> AppState<S, C>
where
    S: OrderStore,
    C: CatalogClient,
{
    /// Wires the order service over `store`, `catalog` and a stats cache on
    /// `cache`.
    pub fn new(
        store: Arc<S>,
        catalog: Arc<C>,
        cache: Arc<dyn CacheBackend>,
        stats_ttl: std::time::Duration,
        auth: JwtVerifier,
    ) -> Self {
        let stats = Arc::new(StatsCache::with_ttl(store.clone(), cache, stats_ttl));
        Self {
            orders: OrderService::new(store, catalog, stats),
            auth,
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, C>(state: Arc<AppState<S, C>>, metrics_handle: PrometheusHandle) -> Router
where
    S: OrderStore + 'static,
    C: CatalogClient + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/api/orders",
            get(routes::orders::list::<S, C>).post(routes::orders::create::<S, C>),
        )
        .route("/api/orders/stats", get(routes::orders::stats::<S, C>))
        .route(
            "/api/orders/{id}",
            get(routes::orders::get::<S, C>).delete(routes::orders::cancel::<S, C>),
        )
        .route(
            "/api/orders/{id}/status",
            put(routes::orders::update_status::<S, C>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
