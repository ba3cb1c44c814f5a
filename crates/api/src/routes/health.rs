//! Health check endpoint.

use axum::{Json, Router, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `true`.
    pub success: bool,
    /// Status message.
    pub message: &'static str,
    /// Server time.
    pub timestamp: DateTime<Utc>,
}

/// Health check handler.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "API is running",
        timestamp: Utc::now(),
    })
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
