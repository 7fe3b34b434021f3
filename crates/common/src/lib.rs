//! Identifier types shared across the order placement crates.

mod types;

pub use types::{OrderId, OwnerId, ParseIdError};
