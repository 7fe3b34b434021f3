//! API server entry point.

use std::sync::Arc;

use api::config::{Config, LogFormat};
use api::{AppState, JwtVerifier};
use catalog::HttpCatalogClient;
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{InMemoryOrderStore, OrderStore, PostgresOrderStore};
use stats::{CacheBackend, InMemoryCache, RedisCache};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn connect_cache(config: &Config) -> Arc<dyn CacheBackend> {
    match &config.redis_url {
        Some(url) => match RedisCache::connect(url).await {
            Ok(cache) => {
                tracing::info!("stats cache on redis");
                Arc::new(cache)
            }
            Err(e) => {
                // Stats still work without a shared cache, just per process.
                tracing::warn!(error = %e, "redis unavailable, caching stats in memory");
                Arc::new(InMemoryCache::new())
            }
        },
        None => Arc::new(InMemoryCache::new()),
    }
}

async fn serve<S: OrderStore + 'static>(
    store: Arc<S>,
    config: Config,
    metrics_handle: PrometheusHandle,
) {
    let catalog =
        Arc::new(HttpCatalogClient::new(config.catalog.clone()).expect("invalid catalog config"));
    let cache = connect_cache(&config).await;
    let state = Arc::new(AppState::new(
        store,
        catalog,
        cache,
        config.stats_ttl,
        JwtVerifier::new(&config.jwt_secret),
    ));
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, catalog = %config.catalog.base_url, "starting order service");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Pick the order store and serve
    match config.database_url.clone() {
        Some(url) => {
            let store = PostgresOrderStore::connect(&url, config.database_max_connections)
                .await
                .expect("failed to connect to database");
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("orders stored in postgres");
            serve(Arc::new(store), config, metrics_handle).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, orders are kept in memory");
            serve(Arc::new(InMemoryOrderStore::new()), config, metrics_handle).await;
        }
    }
}
