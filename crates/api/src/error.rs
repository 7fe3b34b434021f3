//! API error types with HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use placement::{PlacementError, PricingError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// One or more problems with the request body, all reported together.
    Validation(Vec<String>),
    /// Order or catalog item not found (or not visible to the caller).
    NotFound(String),
    /// Request conflicts with the order's current status.
    Conflict(String),
    /// Malformed request outside body validation.
    BadRequest(String),
    /// Missing or invalid credentials.
    Unauthorized(String),
    /// A dependency could not be reached; worth retrying.
    UpstreamUnavailable(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(errors) => {
                let body = serde_json::json!({ "errors": errors });
                return (StatusCode::BAD_REQUEST, Json(body)).into_response();
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) | ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::UpstreamUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

impl From<PlacementError> for ApiError {
    fn from(err: PlacementError) -> Self {
        match err {
            PlacementError::Validation(errors) => ApiError::Validation(errors.into_messages()),
            PlacementError::Pricing(err) => match err {
                PricingError::ItemNotFound(_) => ApiError::NotFound(err.to_string()),
                PricingError::InsufficientStock { .. } | PricingError::AmountOverflow(_) => {
                    ApiError::BadRequest(err.to_string())
                }
                PricingError::CatalogUnavailable { .. } => {
                    ApiError::UpstreamUnavailable(err.to_string())
                }
            },
            PlacementError::OrderNotFound(_) => ApiError::NotFound("Order not found".to_string()),
            err @ (PlacementError::Lifecycle(_) | PlacementError::Contended(_)) => {
                ApiError::Conflict(err.to_string())
            }
            PlacementError::Store(err) => ApiError::Internal(err.to_string()),
        }
    }
}
