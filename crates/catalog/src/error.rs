//! Catalog client error types.

use domain::CatalogItemId;
use thiserror::Error;

/// Errors that can occur during a catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The catalog answered and has no such item.
    #[error("Item {0} not found")]
    NotFound(CatalogItemId),

    /// The catalog could not be reached or gave an unusable answer.
    ///
    /// Covers timeouts, refused connections, non-404 error statuses and
    /// malformed bodies. Safe to retry; `NotFound` is not.
    #[error("Catalog unavailable while looking up item {item_id}: {reason}")]
    Unavailable {
        item_id: CatalogItemId,
        reason: String,
    },

    /// The client itself could not be built.
    #[error("Invalid catalog client configuration: {0}")]
    Configuration(String),
}

impl CatalogError {
    pub(crate) fn unavailable(item_id: &CatalogItemId, reason: impl Into<String>) -> Self {
        CatalogError::Unavailable {
            item_id: item_id.clone(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for catalog results.
pub type Result<T> = std::result::Result<T, CatalogError>;
