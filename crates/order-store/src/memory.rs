use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use domain::{NewOrder, Order};
use tokio::sync::RwLock;

use crate::{
    OrderId, OrderPage, OrderQuery, OwnerId, OwnerTotals, Result, StoreError,
    store::{OrderStore, StatusChange},
};

#[derive(Debug, Default)]
struct InMemoryState {
    orders: HashMap<OrderId, Order>,
    next_id: i64,
}

/// In-memory order store implementation for testing.
///
/// This implementation stores all orders in memory and provides
/// the same interface as the PostgreSQL implementation. A single lock
/// guards the map, so every write is atomic with respect to all others.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<InMemoryState>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored, across all owners.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Makes every subsequent call fail as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: NewOrder) -> Result<Order> {
        self.check_available()?;

        let mut state = self.state.write().await;
        state.next_id += 1;
        let id = OrderId::new(state.next_id);
        let order = order.into_order(id, Utc::now());
        state.orders.insert(id, order.clone());

        Ok(order)
    }

    async fn get(&self, id: OrderId, owner: OwnerId) -> Result<Option<Order>> {
        self.check_available()?;

        let state = self.state.read().await;
        Ok(state
            .orders
            .get(&id)
            .filter(|order| order.is_owned_by(owner))
            .cloned())
    }

    async fn list(&self, query: OrderQuery) -> Result<OrderPage> {
        self.check_available()?;

        let state = self.state.read().await;
        let mut matching: Vec<&Order> = state
            .orders
            .values()
            .filter(|order| {
                if !order.is_owned_by(query.owner) {
                    return false;
                }
                if let Some(status) = query.status
                    && order.status() != status
                {
                    return false;
                }
                true
            })
            .collect();

        // Most recent first; ids break ties between equal timestamps
        matching.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then(b.id().cmp(&a.id()))
        });

        let total = matching.len() as u64;
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let orders = matching
            .into_iter()
            .skip(offset)
            .take(query.page_size as usize)
            .cloned()
            .collect();

        Ok(OrderPage {
            orders,
            total,
            page: query.page,
            page_size: query.page_size,
        })
    }

    async fn update_status(
        &self,
        id: OrderId,
        owner: OwnerId,
        change: StatusChange,
    ) -> Result<Order> {
        self.check_available()?;

        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&id)
            .filter(|order| order.is_owned_by(owner))
            .ok_or(StoreError::OrderNotFound(id))?;

        if order.status() != change.expected() {
            return Err(StoreError::ConcurrencyConflict {
                order_id: id,
                expected: change.expected(),
                actual: order.status(),
            });
        }

        order.transition(change.target(), Utc::now())?;
        Ok(order.clone())
    }

    async fn owner_totals(&self, owner: OwnerId) -> Result<OwnerTotals> {
        self.check_available()?;

        let state = self.state.read().await;
        Ok(OwnerTotals::from_orders(
            state.orders.values().filter(|order| order.is_owned_by(owner)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use domain::{LineItem, Money, OrderStatus};

    use super::*;

    fn new_order(owner: i64, cents: i64, quantity: u32) -> NewOrder {
        NewOrder::new(
            OwnerId::new(owner),
            vec![LineItem::priced("1", "Widget", Money::from_cents(cents), quantity)],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let store = InMemoryOrderStore::new();

        let first = store.create(new_order(1, 1000, 1)).await.unwrap();
        let second = store.create(new_order(1, 1000, 1)).await.unwrap();

        assert_eq!(first.id(), OrderId::new(1));
        assert_eq!(second.id(), OrderId::new(2));
        assert_eq!(first.status(), OrderStatus::Pending);
        assert_eq!(store.order_count().await, 2);
    }

    #[tokio::test]
    async fn get_is_filtered_by_owner() {
        let store = InMemoryOrderStore::new();
        let order = store.create(new_order(1, 1000, 1)).await.unwrap();

        let own = store.get(order.id(), OwnerId::new(1)).await.unwrap();
        assert_eq!(own, Some(order.clone()));

        let foreign = store.get(order.id(), OwnerId::new(2)).await.unwrap();
        assert!(foreign.is_none());

        let missing = store.get(OrderId::new(99), OwnerId::new(1)).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn list_is_most_recent_first_and_paginated() {
        let store = InMemoryOrderStore::new();
        for _ in 0..5 {
            store.create(new_order(1, 100, 1)).await.unwrap();
        }
        store.create(new_order(2, 100, 1)).await.unwrap();

        let page = store
            .list(OrderQuery::for_owner(OwnerId::new(1)).page(1, 2))
            .await
            .unwrap();
        let ids: Vec<i64> = page.orders.iter().map(|o| o.id().as_i64()).collect();
        assert_eq!(ids, vec![5, 4]);
        assert_eq!(page.total, 5);
        assert_eq!(page.pages(), 3);

        let last = store
            .list(OrderQuery::for_owner(OwnerId::new(1)).page(3, 2))
            .await
            .unwrap();
        assert_eq!(last.orders.len(), 1);
        assert_eq!(last.orders[0].id(), OrderId::new(1));
    }

    #[tokio::test]
    async fn list_out_of_range_page_is_empty() {
        let store = InMemoryOrderStore::new();
        store.create(new_order(1, 100, 1)).await.unwrap();

        let page = store
            .list(OrderQuery::for_owner(OwnerId::new(1)).page(10, 10))
            .await
            .unwrap();
        assert!(page.orders.is_empty());
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let store = InMemoryOrderStore::new();
        let a = store.create(new_order(1, 100, 1)).await.unwrap();
        store.create(new_order(1, 100, 1)).await.unwrap();
        store
            .update_status(
                a.id(),
                OwnerId::new(1),
                StatusChange::new(OrderStatus::Pending, OrderStatus::Processing).unwrap(),
            )
            .await
            .unwrap();

        let page = store
            .list(OrderQuery::for_owner(OwnerId::new(1)).status(OrderStatus::Processing))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.orders[0].id(), a.id());
    }

    #[tokio::test]
    async fn update_status_applies_change() {
        let store = InMemoryOrderStore::new();
        let order = store.create(new_order(1, 100, 1)).await.unwrap();

        let updated = store
            .update_status(
                order.id(),
                OwnerId::new(1),
                StatusChange::new(OrderStatus::Pending, OrderStatus::Shipped).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(updated.status(), OrderStatus::Shipped);
        assert!(updated.updated_at() >= order.updated_at());
        assert_eq!(updated.created_at(), order.created_at());
    }

    #[tokio::test]
    async fn update_status_detects_stale_expectation() {
        let store = InMemoryOrderStore::new();
        let order = store.create(new_order(1, 100, 1)).await.unwrap();
        let change = StatusChange::cancel(OrderStatus::Pending).unwrap();

        store
            .update_status(
                order.id(),
                OwnerId::new(1),
                StatusChange::new(OrderStatus::Pending, OrderStatus::Shipped).unwrap(),
            )
            .await
            .unwrap();

        let result = store.update_status(order.id(), OwnerId::new(1), change).await;
        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict {
                actual: OrderStatus::Shipped,
                ..
            })
        ));

        let current = store.get(order.id(), OwnerId::new(1)).await.unwrap().unwrap();
        assert_eq!(current.status(), OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn update_status_hides_foreign_orders() {
        let store = InMemoryOrderStore::new();
        let order = store.create(new_order(1, 100, 1)).await.unwrap();

        let result = store
            .update_status(
                order.id(),
                OwnerId::new(2),
                StatusChange::cancel(OrderStatus::Pending).unwrap(),
            )
            .await;
        assert!(matches!(result, Err(StoreError::OrderNotFound(id)) if id == order.id()));
    }

    #[tokio::test]
    async fn concurrent_cancels_apply_once() {
        let store = InMemoryOrderStore::new();
        let order = store.create(new_order(1, 100, 1)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let id = order.id();
            handles.push(tokio::spawn(async move {
                store
                    .update_status(
                        id,
                        OwnerId::new(1),
                        StatusChange::cancel(OrderStatus::Pending).unwrap(),
                    )
                    .await
            }));
        }

        let mut applied = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                applied += 1;
            }
        }
        assert_eq!(applied, 1);
    }

    #[tokio::test]
    async fn owner_totals_match_orders() {
        let store = InMemoryOrderStore::new();
        let a = store.create(new_order(1, 2999, 2)).await.unwrap();
        store.create(new_order(1, 1000, 1)).await.unwrap();
        store.create(new_order(2, 5000, 1)).await.unwrap();
        store
            .update_status(
                a.id(),
                OwnerId::new(1),
                StatusChange::new(OrderStatus::Pending, OrderStatus::Delivered).unwrap(),
            )
            .await
            .unwrap();

        let totals = store.owner_totals(OwnerId::new(1)).await.unwrap();
        assert_eq!(totals.order_count, 2);
        assert_eq!(totals.total_spent.cents(), 5998 + 1000);
        assert_eq!(totals.pending_count, 1);
        assert_eq!(totals.completed_count, 1);

        let empty = store.owner_totals(OwnerId::new(3)).await.unwrap();
        assert_eq!(empty, OwnerTotals::default());
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = InMemoryOrderStore::new();
        store.set_unavailable(true);

        let result = store.create(new_order(1, 100, 1)).await;
        assert!(matches!(result, Err(StoreError::Database(_))));
        assert_eq!(store.order_count().await, 0);

        store.set_unavailable(false);
        assert!(store.create(new_order(1, 100, 1)).await.is_ok());
    }
}
