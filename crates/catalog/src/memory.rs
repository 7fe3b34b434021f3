//! In-memory catalog for tests and local runs.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use domain::{CatalogItemId, UnitPrice};
use tokio::sync::RwLock;

use crate::client::{CatalogClient, CatalogItem};
use crate::error::{CatalogError, Result};

/// In-memory catalog for testing.
///
/// Can be switched into an "unreachable" mode to exercise the
/// upstream-failure path, and counts lookups so callers can assert on
/// fail-fast behavior.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    items: Arc<RwLock<HashMap<CatalogItemId, CatalogItem>>>,
    unavailable: Arc<AtomicBool>,
    lookups: Arc<AtomicUsize>,
}

impl InMemoryCatalog {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an item.
    pub async fn insert(&self, item: CatalogItem) {
        self.items.write().await.insert(item.id.clone(), item);
    }

    /// Removes an item; later lookups report it as not found.
    pub async fn remove(&self, item_id: &CatalogItemId) {
        self.items.write().await.remove(item_id);
    }

    /// Changes an item's price, if present.
    pub async fn set_price(&self, item_id: &CatalogItemId, price: impl Into<UnitPrice>) {
        if let Some(item) = self.items.write().await.get_mut(item_id) {
            item.price = price.into();
        }
    }

    /// Changes an item's stock, if present.
    pub async fn set_stock(&self, item_id: &CatalogItemId, available_stock: i64) {
        if let Some(item) = self.items.write().await.get_mut(item_id) {
            item.available_stock = available_stock;
        }
    }

    /// Makes every lookup fail as if the catalog were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns the number of lookups served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogClient for InMemoryCatalog {
    async fn lookup(&self, item_id: &CatalogItemId) -> Result<CatalogItem> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::unavailable(item_id, "catalog unreachable"));
        }

        self.items
            .read()
            .await
            .get(item_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(item_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use domain::Money;

    use super::*;

    #[tokio::test]
    async fn test_lookup_known_and_unknown_items() {
        let catalog = InMemoryCatalog::new();
        catalog
            .insert(CatalogItem::new("1", "Widget", Money::from_cents(2999), 100))
            .await;

        let item = catalog.lookup(&CatalogItemId::new("1")).await.unwrap();
        assert_eq!(item.name, "Widget");
        assert_eq!(item.available_stock, 100);

        let missing = catalog.lookup(&CatalogItemId::new("5")).await;
        assert_eq!(missing, Err(CatalogError::NotFound(CatalogItemId::new("5"))));
        assert_eq!(catalog.lookup_count(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_is_distinct_from_not_found() {
        let catalog = InMemoryCatalog::new();
        catalog
            .insert(CatalogItem::new("1", "Widget", Money::from_cents(100), 1))
            .await;
        catalog.set_unavailable(true);

        let result = catalog.lookup(&CatalogItemId::new("1")).await;
        assert!(matches!(result, Err(CatalogError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn test_mutations() {
        let catalog = InMemoryCatalog::new();
        let id = CatalogItemId::new("1");
        catalog
            .insert(CatalogItem::new("1", "Widget", Money::from_cents(100), 1))
            .await;

        catalog.set_price(&id, Money::from_cents(250)).await;
        catalog.set_stock(&id, 7).await;
        let item = catalog.lookup(&id).await.unwrap();
        assert_eq!(item.price, UnitPrice::from(Money::from_cents(250)));
        assert_eq!(item.available_stock, 7);

        catalog.remove(&id).await;
        assert!(matches!(
            catalog.lookup(&id).await,
            Err(CatalogError::NotFound(_))
        ));
    }
}
