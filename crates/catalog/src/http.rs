//! HTTP catalog client backed by reqwest.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use domain::{CatalogItemId, UnitPrice};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::client::{CatalogClient, CatalogItem};
use crate::error::{CatalogError, Result};

/// Where and how to reach the catalog service.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL, e.g. `http://localhost:5002`.
    pub base_url: String,
    /// Path template for a single item; `{id}` is replaced by the item id.
    pub item_path: String,
    /// Upper bound on one lookup, connection included.
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5002".to_string(),
            item_path: "/items/{id}".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Item body as served by the catalog.
#[derive(Debug, Deserialize)]
struct ItemBody {
    name: String,
    price: f64,
    #[serde(rename = "availableStock", alias = "available_stock", alias = "stock")]
    available_stock: i64,
}

/// Either a bare item or the legacy `{"product": {...}}` envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemResponse {
    Enveloped { product: ItemBody },
    Bare(ItemBody),
}

impl ItemResponse {
    fn into_body(self) -> ItemBody {
        match self {
            ItemResponse::Enveloped { product } => product,
            ItemResponse::Bare(body) => body,
        }
    }
}

/// Catalog client talking to the catalog service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: reqwest::Client,
    base_url: Url,
    item_path: String,
}

impl HttpCatalogClient {
    /// Builds a client; the timeout is enforced on every request.
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| CatalogError::Configuration(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::Configuration(format!(
                "{} cannot be used as a base URL",
                config.base_url
            )));
        }
        if !config.item_path.contains("{id}") {
            return Err(CatalogError::Configuration(format!(
                "item path '{}' has no {{id}} placeholder",
                config.item_path
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatalogError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            item_path: config.item_path,
        })
    }

    /// Builds the item URL, percent-encoding the id as a single segment.
    fn item_url(&self, item_id: &CatalogItemId) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            for segment in self.item_path.split('/').filter(|s| !s.is_empty()) {
                if segment == "{id}" {
                    segments.push(item_id.as_str());
                } else {
                    segments.push(segment);
                }
            }
        }
        url
    }

    async fn fetch(&self, item_id: &CatalogItemId) -> Result<CatalogItem> {
        let response = self
            .client
            .get(self.item_url(item_id))
            .send()
            .await
            .map_err(|e| CatalogError::unavailable(item_id, describe(&e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(CatalogError::NotFound(item_id.clone())),
            status if status.is_success() => {
                let body = response
                    .json::<ItemResponse>()
                    .await
                    .map_err(|e| CatalogError::unavailable(item_id, describe(&e)))?
                    .into_body();

                let price = UnitPrice::from_f64(body.price).ok_or_else(|| {
                    CatalogError::unavailable(item_id, format!("invalid price {}", body.price))
                })?;

                Ok(CatalogItem {
                    id: item_id.clone(),
                    name: body.name,
                    price,
                    available_stock: body.available_stock,
                })
            }
            status => Err(CatalogError::unavailable(
                item_id,
                format!("catalog responded with {status}"),
            )),
        }
    }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else if err.is_decode() {
        format!("malformed response: {err}")
    } else {
        err.to_string()
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    #[tracing::instrument(skip(self), fields(item_id = %item_id))]
    async fn lookup(&self, item_id: &CatalogItemId) -> Result<CatalogItem> {
        let start = Instant::now();
        let result = self.fetch(item_id).await;
        metrics::histogram!("catalog_lookup_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        match &result {
            Ok(_) => {}
            Err(CatalogError::NotFound(_)) => {
                metrics::counter!("catalog_lookup_failures_total", "outcome" => "not_found")
                    .increment(1);
            }
            Err(err) => {
                tracing::warn!(error = %err, "catalog lookup failed");
                metrics::counter!("catalog_lookup_failures_total", "outcome" => "unavailable")
                    .increment(1);
            }
        }

        result
    }
}
