//! Success envelope: `{success: true, message?, data?}`.

use axum::{Json, http::StatusCode};
use serde::Serialize;

/// Envelope for successful responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Always `true`; failures go through [`crate::error::ApiError`].
    pub success: bool,
    /// Human-readable outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// 200 with data only.
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        message: None,
        data: Some(data),
    })
}

/// 200 with a message and data.
pub fn ok_with_message<T: Serialize>(message: &str, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        message: Some(message.to_string()),
        data: Some(data),
    })
}

/// 200 with a message only.
pub fn message(message: &str) -> Json<ApiResponse<()>> {
    Json(ApiResponse {
        success: true,
        message: Some(message.to_string()),
        data: None,
    })
}

/// 201 with a message and data.
pub fn created<T: Serialize>(message: &str, data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, ok_with_message(message, data))
}
