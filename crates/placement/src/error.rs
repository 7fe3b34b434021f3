//! Placement error types.

use catalog::CatalogError;
use common::OrderId;
use domain::{CatalogItemId, OrderError, ValidationErrors};
use order_store::StoreError;
use thiserror::Error;

/// Reasons the pricing pass rejects a request. Only the first problem
/// encountered is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// The catalog confirmed the item does not exist.
    #[error("Item {0} not found")]
    ItemNotFound(CatalogItemId),

    /// The catalog has fewer units than requested.
    #[error("Insufficient stock for item {item_id}")]
    InsufficientStock {
        item_id: CatalogItemId,
        requested: u32,
        available: i64,
    },

    /// The catalog could not be consulted. Retryable.
    #[error("Catalog service unavailable")]
    CatalogUnavailable { item_id: CatalogItemId, reason: String },

    /// Price times quantity does not fit in the money type.
    #[error("Order amount too large for item {0}")]
    AmountOverflow(CatalogItemId),
}

impl PricingError {
    /// Classifies a failed lookup of `item_id`.
    pub fn from_lookup(item_id: &CatalogItemId, err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) => PricingError::ItemNotFound(item_id.clone()),
            CatalogError::Unavailable { reason, .. } | CatalogError::Configuration(reason) => {
                PricingError::CatalogUnavailable {
                    item_id: item_id.clone(),
                    reason,
                }
            }
        }
    }

    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            PricingError::ItemNotFound(_) => "item_not_found",
            PricingError::InsufficientStock { .. } => "insufficient_stock",
            PricingError::CatalogUnavailable { .. } => "catalog_unavailable",
            PricingError::AmountOverflow(_) => "amount_overflow",
        }
    }
}

/// Errors returned by [`crate::OrderService`].
#[derive(Debug, Error)]
pub enum PlacementError {
    /// The request is malformed; every problem is listed.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Pricing rejected the request; nothing was persisted.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// No such order for this owner.
    #[error("Order not found")]
    OrderNotFound(OrderId),

    /// The requested status change is not allowed from the current status.
    #[error(transparent)]
    Lifecycle(#[from] OrderError),

    /// The order kept changing under us; the caller may retry.
    #[error("Order {0} is being modified concurrently")]
    Contended(OrderId),

    /// The store failed.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<ValidationErrors> for PlacementError {
    fn from(errors: ValidationErrors) -> Self {
        PlacementError::Validation(errors)
    }
}

impl From<StoreError> for PlacementError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::OrderNotFound(id) => PlacementError::OrderNotFound(id),
            StoreError::Lifecycle(err) => PlacementError::Lifecycle(err),
            StoreError::ConcurrencyConflict { order_id, .. } => PlacementError::Contended(order_id),
            other => PlacementError::Store(other),
        }
    }
}

/// Result type for placement operations.
pub type Result<T> = std::result::Result<T, PlacementError>;
