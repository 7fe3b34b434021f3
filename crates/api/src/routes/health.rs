//! Health check endpoint.

use axum::Json;
use serde::Serialize;

pub const SERVICE_NAME: &str = "order-service";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// GET /health: liveness probe, no dependencies consulted.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
    })
}
