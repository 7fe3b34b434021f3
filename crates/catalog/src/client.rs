//! Catalog client trait and item type.

use async_trait::async_trait;
use domain::{CatalogItemId, UnitPrice};

use crate::error::Result;

/// Point-in-time view of a catalog item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: CatalogItemId,
    pub name: String,
    /// Unit price exactly as quoted.
    pub price: UnitPrice,
    /// Units in stock when the lookup was answered; may already be stale.
    pub available_stock: i64,
}

impl CatalogItem {
    pub fn new(
        id: impl Into<CatalogItemId>,
        name: impl Into<String>,
        price: impl Into<UnitPrice>,
        available_stock: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price: price.into(),
            available_stock,
        }
    }
}

/// Read-only access to the catalog.
///
/// Implementations must not retry internally: stock is a point-in-time
/// figure and a retry would silently change what the caller checked.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Looks up one item by id.
    async fn lookup(&self, item_id: &CatalogItemId) -> Result<CatalogItem>;
}
