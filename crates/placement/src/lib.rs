//! Order placement orchestration.
//!
//! This crate ties the components together:
//! - [`PricingResolver`] prices a validated request against the catalog,
//!   failing fast on the first unknown, out-of-stock or unreachable item
//! - [`OrderService`] runs placement (validate, price, persist, invalidate
//!   stats) and the status lifecycle on top of the order store
//!
//! Stock is checked, never reserved: two concurrent orders may both pass
//! the check against the same remaining units.

pub mod error;
pub mod pricing;
pub mod service;

pub use error::{PlacementError, PricingError, Result};
pub use pricing::{PricedItems, PricingResolver};
pub use service::{MAX_STATUS_ATTEMPTS, OrderService};
