use domain::{OrderError, OrderStatus};
use thiserror::Error;

use crate::OrderId;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No order with this id belongs to the caller.
    ///
    /// Deliberately the same outcome whether the order is missing or owned
    /// by someone else.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order's status changed between read and write.
    #[error(
        "Concurrency conflict for order {order_id}: expected status {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// A status change was not a legal lifecycle edge.
    #[error("Lifecycle violation: {0}")]
    Lifecycle(#[from] OrderError),

    /// A persisted row could not be turned back into an order.
    #[error("Corrupt order record {order_id}: {reason}")]
    Corrupt { order_id: OrderId, reason: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
