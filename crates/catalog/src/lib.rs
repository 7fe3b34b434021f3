//! Catalog client.
//!
//! Looks up price, name and available stock of catalog items. Lookups are
//! pure reads with a bounded timeout and no internal retries: a confirmed
//! "no such item" is [`CatalogError::NotFound`], every transport problem is
//! [`CatalogError::Unavailable`].

pub mod client;
pub mod error;
pub mod http;
pub mod memory;

pub use client::{CatalogClient, CatalogItem};
pub use error::{CatalogError, Result};
pub use http::{CatalogConfig, HttpCatalogClient};
pub use memory::InMemoryCatalog;
