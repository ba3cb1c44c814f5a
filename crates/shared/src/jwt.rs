//! JWT token generation and validation.
//!
//! Access and refresh tokens are signed with separate secrets, so a refresh
//! token can never pass as an access token and vice versa.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::{Claims, TokenKind, TokenPair};
use crate::config::JwtSettings;

/// JWT configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing access tokens.
    pub access_secret: String,
    /// Secret key for signing refresh tokens.
    pub refresh_secret: String,
    /// Access token lifetime in seconds.
    pub access_token_expiry_secs: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_token_expiry_secs: i64,
}

impl From<&JwtSettings> for JwtConfig {
    fn from(settings: &JwtSettings) -> Self {
        Self {
            access_secret: settings.access_secret.clone(),
            refresh_secret: settings.refresh_secret.clone(),
            access_token_expiry_secs: i64::try_from(settings.access_token_expiry_secs)
                .unwrap_or(i64::MAX),
            refresh_token_expiry_secs: i64::try_from(settings.refresh_token_expiry_secs)
                .unwrap_or(i64::MAX),
        }
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token is well-formed but of the wrong kind.
    #[error("invalid token")]
    Invalid,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// JWT service for token operations.
#[derive(Clone)]
pub struct JwtService {
    access_ttl: Duration,
    refresh_ttl: Duration,
    access: std::sync::Arc<KeyPair>,
    refresh: std::sync::Arc<KeyPair>,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("access_keys", &"[hidden]")
            .field("refresh_keys", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a new JWT service with the given configuration.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            access_ttl: Duration::seconds(config.access_token_expiry_secs),
            refresh_ttl: Duration::seconds(config.refresh_token_expiry_secs),
            access: std::sync::Arc::new(KeyPair::from_secret(&config.access_secret)),
            refresh: std::sync::Arc::new(KeyPair::from_secret(&config.refresh_secret)),
        }
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    fn generate(
        &self,
        user_id: Uuid,
        email: &str,
        kind: TokenKind,
    ) -> Result<(String, Claims), JwtError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims::new(user_id, email, kind, Utc::now() + ttl);

        let token = encode(&Header::default(), &claims, &self.keys(kind).encoding)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;
        Ok((token, claims))
    }

    /// Generates an access token for a user.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn generate_access_token(&self, user_id: Uuid, email: &str) -> Result<String, JwtError> {
        self.generate(user_id, email, TokenKind::Access)
            .map(|(token, _)| token)
    }

    /// Generates an access and refresh token pair for a user.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn generate_pair(&self, user_id: Uuid, email: &str) -> Result<TokenPair, JwtError> {
        let access_token = self.generate_access_token(user_id, email)?;
        let (refresh_token, refresh_claims) = self.generate(user_id, email, TokenKind::Refresh)?;
        let refresh_expires_at = refresh_claims
            .expires_at()
            .unwrap_or_else(|| Utc::now() + self.refresh_ttl);

        Ok(TokenPair {
            access_token,
            refresh_token,
            refresh_expires_at,
        })
    }

    fn validate(&self, token: &str, kind: TokenKind) -> Result<Claims, JwtError> {
        let validation = Validation::default();

        let claims = decode::<Claims>(token, &self.keys(kind).decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::DecodingError(e.to_string()),
            })?;

        if claims.kind != kind {
            return Err(JwtError::Invalid);
        }
        Ok(claims)
    }

    /// Validates and decodes an access token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired.
    /// Returns `JwtError::DecodingError` or `JwtError::Invalid` if the token is malformed
    /// or was not issued as an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate(token, TokenKind::Access)
    }

    /// Validates and decodes a refresh token.
    ///
    /// # Errors
    ///
    /// Same as [`JwtService::validate_access_token`], for refresh tokens.
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate(token, TokenKind::Refresh)
    }

    /// Returns the access token lifetime in seconds.
    #[must_use]
    pub const fn access_token_expires_in(&self) -> i64 {
        self.access_ttl.num_seconds()
    }
}

#[cfg(test)]
#[path = "jwt_tests.rs"]
mod tests;
