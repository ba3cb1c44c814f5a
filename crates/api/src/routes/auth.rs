//! Authentication routes: registration, login, token rotation and password reset.

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, header::USER_AGENT},
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    cookies::{REFRESH_COOKIE, clear_auth_cookies, set_auth_cookies},
    error::{ApiError, ApiResult},
    extractors::{ValidatedJson, validate_otp},
    middleware::AuthUser,
    response::{created, message, ok, ok_with_message},
};
use spendwise_core::auth::{hash_password, verify_password};
use spendwise_db::{
    PasswordResetRepository, SessionRepository, UserRepository, entities::users,
    repositories::UserError,
};

const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent.";

/// Public auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

/// Auth routes that need an authenticated user.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/change-password", post(change_password))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name.
    #[validate(length(min = 2, max = 100, message = "Name must be at least 2 characters"))]
    pub name: String,
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Plain-text password.
    #[validate(length(min = 6, max = 100, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Plain-text password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request body for requesting a reset code.
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// Request body for resetting a password with a code.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Six-digit code from the email.
    #[validate(custom(function = "validate_otp"))]
    pub otp: String,
    /// New password.
    #[validate(length(min = 6, max = 100, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

/// Request body for changing a password.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// Current password.
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    /// New password.
    #[validate(length(min = 6, max = 100, message = "New password must be at least 6 characters"))]
    pub new_password: String,
}

/// Public view of a user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Avatar URL.
    pub avatar: Option<String>,
    /// Whether the account is active.
    pub is_active: bool,
    /// Created at timestamp.
    pub created_at: DateTime<Utc>,
    /// Updated at timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            avatar: user.avatar,
            is_active: user.is_active,
            created_at: user.created_at.with_timezone(&Utc),
            updated_at: user.updated_at.with_timezone(&Utc),
        }
    }
}

/// Response data after registration or login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Authenticated user.
    pub user: UserResponse,
    /// Access token (also set as a cookie).
    pub access_token: String,
}

/// Response data after a token refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// New access token.
    pub access_token: String,
}

/// Response data for `/auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// Current user.
    pub user: UserResponse,
}

// ============================================================================
// Helpers
// ============================================================================

fn user_agent(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_AGENT).and_then(|h| h.to_str().ok())
}

/// Issues a token pair, records the refresh session and sets both cookies.
async fn start_session(
    state: &AppState,
    user: &users::Model,
    user_agent: Option<&str>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, String)> {
    let pair = state.jwt_service.generate_pair(user.id, &user.email)?;

    SessionRepository::new((*state.db).clone())
        .create(user.id, &pair.refresh_token, pair.refresh_expires_at, user_agent)
        .await?;

    let jar = set_auth_cookies(
        jar,
        &pair.access_token,
        &pair.refresh_token,
        state.server.secure_cookies,
    );
    Ok((jar, pair.access_token))
}

/// Verifies the current password, stores the new one and revokes every session.
pub(crate) async fn change_password_for(
    state: &AppState,
    user_id: Uuid,
    current_password: &str,
    new_password: &str,
) -> ApiResult<()> {
    let user_repo = UserRepository::new((*state.db).clone());
    let user = user_repo
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !verify_password(current_password, &user.password_hash)? {
        return Err(ApiError::bad_request("Current password is incorrect"));
    }

    let password_hash = hash_password(new_password)?;
    user_repo.update_password(user.id, &password_hash).await?;
    let revoked = SessionRepository::new((*state.db).clone())
        .revoke_all_user_sessions(user.id)
        .await?;

    info!(user_id = %user.id, revoked, "Password changed");
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register - Register a new user and sign them in.
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let password_hash = hash_password(&payload.password)?;

    let user = UserRepository::new((*state.db).clone())
        .create(&payload.name, &payload.email, &password_hash)
        .await
        .map_err(|e| match e {
            UserError::EmailTaken => ApiError::conflict("User with this email already exists"),
            other => other.into(),
        })?;

    let (jar, access_token) = start_session(&state, &user, user_agent(&headers), jar).await?;
    info!(user_id = %user.id, "New user registered");

    Ok((
        jar,
        created(
            "User registered successfully",
            AuthResponse {
                user: user.into(),
                access_token,
            },
        ),
    ))
}

/// POST /auth/login - Authenticate and issue tokens.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = UserRepository::new((*state.db).clone())
        .find_by_email(&payload.email)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        info!(user_id = %user.id, "Failed login attempt - invalid password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let (jar, access_token) = start_session(&state, &user, user_agent(&headers), jar).await?;
    info!(user_id = %user.id, "User logged in");

    Ok((
        jar,
        ok_with_message(
            "Login successful",
            AuthResponse {
                user: user.into(),
                access_token,
            },
        ),
    ))
}

/// POST /auth/refresh - Rotate the refresh session and issue new tokens.
async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Refresh token not found"))?;

    let claims = state
        .jwt_service
        .validate_refresh_token(&token)
        .map_err(|_| ApiError::unauthorized("Invalid refresh token"))?;

    let sessions = SessionRepository::new((*state.db).clone());
    let session = sessions
        .find_active_by_token(&token)
        .await?
        .filter(|s| s.user_id == claims.user_id())
        .ok_or_else(|| ApiError::unauthorized("Invalid refresh token"))?;

    let user = UserRepository::new((*state.db).clone())
        .find_active_by_id(session.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    if !sessions.revoke(session.id).await? {
        return Err(ApiError::unauthorized("Invalid refresh token"));
    }
    let (jar, access_token) = start_session(&state, &user, user_agent(&headers), jar).await?;

    Ok((
        jar,
        ok_with_message("Token refreshed successfully", RefreshResponse { access_token }),
    ))
}

/// POST /auth/logout - Revoke the presented session and clear cookies.
async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(token) = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()) {
        if let Err(e) = SessionRepository::new((*state.db).clone())
            .revoke_by_token(&token)
            .await
        {
            warn!(error = %e, "Failed to revoke session on logout");
        }
    }

    (clear_auth_cookies(jar), message("Logout successful"))
}

/// POST /auth/forgot-password - Email a reset code if the account exists.
///
/// The response is identical whether or not the email is registered.
async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = UserRepository::new((*state.db).clone())
        .find_by_email(&payload.email)
        .await?
        .filter(|u| u.is_active);

    if let Some(user) = user {
        let otp = PasswordResetRepository::new((*state.db).clone())
            .create_otp(user.id, state.email_service.otp_expiry_minutes())
            .await?;

        let email_service = state.email_service.clone();
        tokio::spawn(async move {
            if let Err(e) = email_service
                .send_password_reset_otp(&user.email, &user.name, &otp)
                .await
            {
                warn!(user_id = %user.id, error = %e, "Failed to send password reset email");
            }
        });
        info!(user_id = %user.id, "Password reset code issued");
    }

    Ok(message(FORGOT_PASSWORD_MESSAGE))
}

/// POST /auth/reset-password - Consume a reset code and set a new password.
async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    let invalid = || ApiError::bad_request("Invalid or expired OTP");

    let user_repo = UserRepository::new((*state.db).clone());
    let user = user_repo
        .find_by_email(&payload.email)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(invalid)?;

    let consumed = PasswordResetRepository::new((*state.db).clone())
        .consume(user.id, &payload.otp)
        .await?;
    if !consumed {
        return Err(invalid());
    }

    let password_hash = hash_password(&payload.new_password)?;
    user_repo.update_password(user.id, &password_hash).await?;
    SessionRepository::new((*state.db).clone())
        .revoke_all_user_sessions(user.id)
        .await?;

    info!(user_id = %user.id, "Password reset");
    Ok(message("Password reset successfully"))
}

/// GET /auth/me - Current user.
async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<impl IntoResponse> {
    let user = UserRepository::new((*state.db).clone())
        .find_by_id(auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ok(MeResponse { user: user.into() }))
}

/// POST /auth/change-password - Change password and sign out everywhere.
async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    change_password_for(&state, auth.id, &payload.current_password, &payload.new_password).await?;

    Ok((
        clear_auth_cookies(jar),
        message("Password changed successfully. Please log in again."),
    ))
}
