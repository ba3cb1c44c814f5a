//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api`
//! - Authentication middleware
//! - Validated request extractors
//! - The response envelope and error mapping

pub mod cookies;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod routes;

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use sea_orm::DatabaseConnection;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use spendwise_shared::{EmailService, JwtService, ServerConfig};

/// Largest accepted request body.
const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Email service for password reset codes.
    pub email_service: Arc<EmailService>,
    /// HTTP settings (CORS origin, cookie flags).
    pub server: Arc<ServerConfig>,
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = match HeaderValue::from_str(origin) {
        Ok(value) => AllowOrigin::exact(value),
        Err(e) => {
            warn!(origin, error = %e, "Invalid CORS origin; cross-origin requests will be refused");
            AllowOrigin::list(Vec::new())
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static("x-requested-with"),
        ])
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.server.cors_origin);

    Router::new()
        .nest("/api", routes::api_routes_with_state(state.clone()))
        .fallback(routes::not_found)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
