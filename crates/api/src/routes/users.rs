//! Account routes for the signed-in user.

use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::{delete, get, put},
};
use axum_extra::extract::cookie::CookieJar;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;
use validator::Validate;

use crate::{
    AppState,
    cookies::clear_auth_cookies,
    error::{ApiError, ApiResult},
    extractors::ValidatedJson,
    middleware::AuthUser,
    response::{message, ok, ok_with_message},
    routes::{
        auth::{ChangePasswordRequest, UserResponse, change_password_for},
        expenses::ExpenseResponse,
    },
};
use spendwise_db::{
    ExpenseRepository, SessionRepository, UserRepository, repositories::UpdateProfileInput,
};

/// Creates the user routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/profile", get(get_profile).put(update_profile))
        .route("/users/password", put(change_password))
        .route("/users/account", delete(delete_account))
        .route("/users/stats", get(user_stats))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for a profile update. Blank fields are ignored.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    /// New display name.
    #[serde(default, deserialize_with = "non_blank")]
    #[validate(length(min = 2, max = 100, message = "Name must be at least 2 characters"))]
    pub name: Option<String>,
    /// New email.
    #[serde(default, deserialize_with = "non_blank")]
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    /// New avatar URL.
    #[serde(default, deserialize_with = "non_blank")]
    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar: Option<String>,
}

/// Trims a string field and drops it when nothing is left.
fn non_blank<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}

/// Profile with the number of recorded expenses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    /// The user.
    #[serde(flatten)]
    pub user: UserResponse,
    /// Number of expenses.
    pub expense_count: u64,
}

/// Spending overview for the account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsResponse {
    /// Number of expenses.
    pub total_expenses: u64,
    /// Sum of all expenses.
    pub total_amount: Decimal,
    /// Distinct categories used.
    pub categories_used: u64,
    /// Five most recently created expenses.
    pub recent_expenses: Vec<ExpenseResponse>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /users/profile - Profile with expense count.
async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let user = UserRepository::new((*state.db).clone())
        .find_by_id(auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let expense_count = ExpenseRepository::new((*state.db).clone())
        .count_for_user(auth.id)
        .await?;

    Ok(ok(serde_json::json!({
        "user": ProfileResponse { user: user.into(), expense_count }
    })))
}

/// PUT /users/profile - Update name, email or avatar.
async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = UserRepository::new((*state.db).clone())
        .update_profile(
            auth.id,
            UpdateProfileInput {
                name: payload.name,
                email: payload.email.map(|email| email.to_lowercase()),
                avatar: payload.avatar,
            },
        )
        .await?;

    info!(user_id = %auth.id, "Profile updated");
    Ok(ok_with_message(
        "Profile updated successfully",
        serde_json::json!({ "user": UserResponse::from(user) }),
    ))
}

/// PUT /users/password - Change password and sign out everywhere.
async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    change_password_for(&state, auth.id, &payload.current_password, &payload.new_password).await?;

    Ok((
        clear_auth_cookies(jar),
        message("Password changed successfully"),
    ))
}

/// DELETE /users/account - Deactivate the account.
async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    UserRepository::new((*state.db).clone())
        .deactivate(auth.id)
        .await?;
    SessionRepository::new((*state.db).clone())
        .revoke_all_user_sessions(auth.id)
        .await?;

    info!(user_id = %auth.id, "Account deactivated");
    Ok((
        clear_auth_cookies(jar),
        message("Account deleted successfully"),
    ))
}

/// GET /users/stats - Spending overview.
async fn user_stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let stats = ExpenseRepository::new((*state.db).clone())
        .user_stats(auth.id)
        .await?;

    Ok(ok(serde_json::json!({
        "stats": UserStatsResponse {
            total_expenses: stats.total_expenses,
            total_amount: stats.total_amount,
            categories_used: stats.categories_used,
            recent_expenses: stats
                .recent_expenses
                .into_iter()
                .map(ExpenseResponse::from)
                .collect(),
        }
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_update_ignores_blank_fields() {
        let request: UpdateProfileRequest = serde_json::from_value(json!({
            "name": "  Ada Lovelace  ",
            "email": "   ",
            "avatar": ""
        }))
        .unwrap();

        assert_eq!(request.name.as_deref(), Some("Ada Lovelace"));
        assert!(request.email.is_none());
        assert!(request.avatar.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_profile_update_rejects_bad_avatar() {
        let request: UpdateProfileRequest =
            serde_json::from_value(json!({"avatar": "not a url"})).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_profile_update_rejects_bad_email() {
        let request: UpdateProfileRequest =
            serde_json::from_value(json!({"email": "nobody"})).unwrap();
        assert!(request.validate().is_err());
    }
}
