//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::{AppState, cookies::ACCESS_COOKIE, error::ApiError};
use spendwise_db::UserRepository;
use spendwise_shared::JwtError;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Finds the access token: the `accessToken` cookie first, then a Bearer header.
fn access_token(jar: &CookieJar, request: &Request) -> Option<String> {
    jar.get(ACCESS_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| {
            request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(extract_bearer_token)
                .map(str::to_string)
        })
}

/// Authentication middleware.
///
/// Validates the access token, then checks the user still exists and is
/// active before handing an [`AuthUser`] to the handler.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = access_token(&jar, &request) else {
        return Err(ApiError::unauthorized("Access token not found"));
    };

    let claims = state
        .jwt_service
        .validate_access_token(&token)
        .map_err(|e| match e {
            JwtError::Expired => ApiError::unauthorized("Access token expired"),
            _ => ApiError::unauthorized("Invalid access token"),
        })?;

    let user = UserRepository::new((*state.db).clone())
        .find_active_by_id(claims.user_id())
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found or inactive"))?;

    request.extensions_mut().insert(AuthUser {
        id: user.id,
        email: user.email,
    });
    Ok(next.run(request).await)
}

/// The authenticated, active user behind a request.
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     let user_id = auth.id;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// User ID.
    pub id: Uuid,
    /// Current email.
    pub email: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_cookie_wins_over_header() {
        let request = Request::builder()
            .header(AUTHORIZATION, "Bearer from-header")
            .header("cookie", "accessToken=from-cookie")
            .body(Body::empty())
            .unwrap();
        let jar = CookieJar::from_headers(request.headers());

        assert_eq!(access_token(&jar, &request).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_header_used_without_cookie() {
        let request = Request::builder()
            .header(AUTHORIZATION, "Bearer from-header")
            .body(Body::empty())
            .unwrap();
        let jar = CookieJar::from_headers(request.headers());

        assert_eq!(access_token(&jar, &request).as_deref(), Some("from-header"));
    }
}
