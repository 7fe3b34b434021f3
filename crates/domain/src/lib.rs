//! Domain layer for order placement.
//!
//! This crate provides:
//! - The [`Order`] aggregate with its priced line-item snapshot
//! - The [`OrderStatus`] lifecycle state machine
//! - Structural validation of incoming order requests

pub mod order;
pub mod validation;

pub use order::{
    CatalogItemId, LineItem, Money, NewOrder, Order, OrderError, OrderStatus, ParseStatusError,
    UnitPrice,
};
pub use validation::{OrderRequest, RequestedItem, ValidationErrors, validate_order_request};
