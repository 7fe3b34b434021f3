//! Order service: placement and lifecycle orchestration.

use std::sync::Arc;
use std::time::Instant;

use catalog::CatalogClient;
use common::{OrderId, OwnerId};
use domain::{NewOrder, Order, OrderError, OrderStatus, ValidationErrors, validate_order_request};
use order_store::{OrderPage, OrderQuery, OrderStore, OrderStoreExt, StatusChange, StoreError};
use serde_json::Value;
use stats::{StatsCache, StatsSnapshot};

use crate::{PlacementError, PricingResolver, Result};

/// How many times a status change is attempted when the order keeps
/// changing between read and write.
pub const MAX_STATUS_ATTEMPTS: usize = 3;

/// Orchestrates order placement and status changes.
///
/// The store is the only writer of order state. After each write that can
/// change an owner's figures, the owner's cached stats are invalidated
/// before the call returns.
pub struct OrderService<S, C> {
    store: Arc<S>,
    pricing: PricingResolver<C>,
    stats: Arc<StatsCache<S>>,
}

impl<S, C> OrderService<S, C>
where
    S: OrderStore,
    C: CatalogClient,
{
    pub fn new(store: Arc<S>, catalog: Arc<C>, stats: Arc<StatsCache<S>>) -> Self {
        Self {
            store,
            pricing: PricingResolver::new(catalog),
            stats,
        }
    }

    /// Validates, prices and persists a new order for `owner`.
    ///
    /// Nothing is written unless every item prices successfully.
    #[tracing::instrument(skip(self, payload))]
    pub async fn place_order(&self, owner: OwnerId, payload: &Value) -> Result<Order> {
        let start = Instant::now();

        let request = validate_order_request(payload, owner).inspect_err(|_| {
            metrics::counter!("orders_rejected_total", "reason" => "validation").increment(1);
        })?;

        let priced = self
            .pricing
            .resolve(&request.items)
            .await
            .inspect_err(|err| {
                tracing::info!(error = %err, "order rejected during pricing");
                metrics::counter!("orders_rejected_total", "reason" => err.reason())
                    .increment(1);
            })?;

        let new_order = NewOrder::new(request.owner, priced.line_items).map_err(|err| {
            let mut errors = ValidationErrors::new();
            errors.push(err.to_string());
            PlacementError::Validation(errors)
        })?;

        let order = self.store.create(new_order).await?;
        self.stats.invalidate(owner).await;

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("order_placement_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        tracing::info!(order_id = %order.id(), total = %order.total(), "order placed");

        Ok(order)
    }

    /// Loads one of `owner`'s orders.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, owner: OwnerId, id: OrderId) -> Result<Order> {
        Ok(self.store.get_required(id, owner).await?)
    }

    /// Lists a page of the query owner's orders, most recent first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self, query: OrderQuery) -> Result<OrderPage> {
        Ok(self.store.list(query).await?)
    }

    /// Moves an order to `target` if the lifecycle allows it.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        owner: OwnerId,
        id: OrderId,
        target: OrderStatus,
    ) -> Result<Order> {
        self.change_status(owner, id, |current| StatusChange::new(current, target))
            .await
    }

    /// Cancels an order that has not shipped yet.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, owner: OwnerId, id: OrderId) -> Result<Order> {
        self.change_status(owner, id, StatusChange::cancel).await
    }

    /// Returns `owner`'s stats, served from the cache when fresh.
    #[tracing::instrument(skip(self))]
    pub async fn get_stats(&self, owner: OwnerId) -> Result<StatsSnapshot> {
        Ok(self.stats.get_stats(owner).await?)
    }

    /// Reads the current status, plans the change from it and writes it
    /// conditionally. A concurrent change between read and write triggers a
    /// re-read, so the lifecycle is always checked against the status the
    /// write actually replaces.
    async fn change_status<F>(&self, owner: OwnerId, id: OrderId, plan: F) -> Result<Order>
    where
        F: Fn(OrderStatus) -> std::result::Result<StatusChange, OrderError> + Send + Sync,
    {
        for attempt in 1..=MAX_STATUS_ATTEMPTS {
            let order = self.store.get_required(id, owner).await?;
            let change = plan(order.status()).inspect_err(|err| {
                tracing::info!(error = %err, "status change rejected");
                metrics::counter!("order_status_rejections_total").increment(1);
            })?;

            match self.store.update_status(id, owner, change).await {
                Ok(updated) => {
                    // Pending count moves whenever an order leaves pending.
                    if change.target().affects_stats() || change.expected() == OrderStatus::Pending
                    {
                        self.stats.invalidate(owner).await;
                    }
                    metrics::counter!(
                        "order_status_transitions_total",
                        "to" => change.target().as_str()
                    )
                    .increment(1);
                    tracing::info!(
                        from = %change.expected(),
                        to = %change.target(),
                        "order status changed"
                    );
                    return Ok(updated);
                }
                Err(StoreError::ConcurrencyConflict { actual, .. }) => {
                    tracing::debug!(attempt, %actual, "status changed concurrently, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        tracing::warn!(attempts = MAX_STATUS_ATTEMPTS, "giving up on contended status change");
        Err(PlacementError::Contended(id))
    }
}
