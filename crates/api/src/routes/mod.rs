//! API route definitions.

use axum::{Router, middleware, response::IntoResponse};

use crate::{AppState, error::ApiError, middleware::auth_middleware};

pub mod auth;
pub mod budgets;
pub mod categories;
pub mod expenses;
pub mod health;
pub mod incomes;
pub mod users;

/// Creates the API router; everything except health and the public auth routes
/// goes through the auth middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(users::routes())
        .merge(categories::routes())
        .merge(expenses::routes())
        .merge(incomes::routes())
        .merge(budgets::routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}

/// Fallback for unknown routes.
pub async fn not_found() -> impl IntoResponse {
    ApiError::not_found("Route not found")
}
