//! Order aggregate and related types.

mod aggregate;
mod state;
mod value_objects;

pub use aggregate::{NewOrder, Order};
pub use state::{OrderStatus, ParseStatusError};
pub use value_objects::{CatalogItemId, LineItem, Money, UnitPrice};

use thiserror::Error;

/// Errors raised by order invariants and the lifecycle state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The requested status change is not an edge of the lifecycle.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Cancellation is only possible before the order ships.
    #[error("Cannot cancel order in {current} status")]
    CannotCancel { current: OrderStatus },

    /// An order must contain at least one line item.
    #[error("Order has no line items")]
    NoLineItems,

    /// Every line item quantity must be at least one.
    #[error("Invalid quantity {quantity} for item {item_id} (must be greater than 0)")]
    InvalidQuantity { item_id: CatalogItemId, quantity: u32 },

    /// The order total does not fit in a money amount.
    #[error("Order total is too large")]
    AmountOverflow,
}
