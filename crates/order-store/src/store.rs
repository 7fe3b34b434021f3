use async_trait::async_trait;
use domain::{NewOrder, Order, OrderError, OrderStatus};

use crate::{OrderId, OrderPage, OrderQuery, OwnerId, OwnerTotals, Result, StoreError};

/// A checked status change, applied only if the order is still in
/// `expected` when the write happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    expected: OrderStatus,
    target: OrderStatus,
}

impl StatusChange {
    /// Builds a change along a legal lifecycle edge.
    pub fn new(expected: OrderStatus, target: OrderStatus) -> std::result::Result<Self, OrderError> {
        let target = expected.transition_to(target)?;
        Ok(Self { expected, target })
    }

    /// Builds a cancellation from `current`.
    pub fn cancel(current: OrderStatus) -> std::result::Result<Self, OrderError> {
        let target = current.cancel()?;
        Ok(Self {
            expected: current,
            target,
        })
    }

    pub fn expected(&self) -> OrderStatus {
        self.expected
    }

    pub fn target(&self) -> OrderStatus {
        self.target
    }
}

/// Core trait for order store implementations.
///
/// The store is the only writer of order state. Every read and write is
/// filtered by owner; an order owned by someone else behaves exactly like
/// a missing one. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order and returns it with its assigned id.
    async fn create(&self, order: NewOrder) -> Result<Order>;

    /// Loads an order owned by `owner`.
    ///
    /// Returns None if it doesn't exist or belongs to another owner.
    async fn get(&self, id: OrderId, owner: OwnerId) -> Result<Option<Order>>;

    /// Lists one page of an owner's orders, most recent first.
    async fn list(&self, query: OrderQuery) -> Result<OrderPage>;

    /// Applies a status change atomically with respect to other writes on
    /// the same order.
    ///
    /// Fails with `OrderNotFound` if the order isn't visible to `owner`, or
    /// `ConcurrencyConflict` if its status is no longer `change.expected()`.
    async fn update_status(
        &self,
        id: OrderId,
        owner: OwnerId,
        change: StatusChange,
    ) -> Result<Order>;

    /// Computes aggregate figures over all of an owner's orders.
    async fn owner_totals(&self, owner: OwnerId) -> Result<OwnerTotals>;
}

/// Extension trait providing convenience methods for order stores.
#[async_trait]
pub trait OrderStoreExt: OrderStore {
    /// Loads an order, turning absence into `OrderNotFound`.
    async fn get_required(&self, id: OrderId, owner: OwnerId) -> Result<Order> {
        self.get(id, owner)
            .await?
            .ok_or(StoreError::OrderNotFound(id))
    }
}

// Blanket implementation for all OrderStore implementations
impl<T: OrderStore + ?Sized> OrderStoreExt for T {}
