//! Refresh-token sessions.
//!
//! Each issued refresh token has one row, looked up by the SHA-256 of the
//! token. A session is live while `revoked_at` is null and `expires_at` is in
//! the future.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    sea_query::Expr,
};
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use crate::entities::sessions;

/// Lowercase hex SHA-256 of a refresh token.
#[must_use]
pub fn token_fingerprint(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Session repository.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    db: DatabaseConnection,
}

impl SessionRepository {
    /// Creates a new session repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a freshly issued refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        user_id: Uuid,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
        user_agent: Option<&str>,
    ) -> Result<sessions::Model, DbErr> {
        let now = Utc::now().into();

        sessions::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            refresh_token_hash: Set(token_fingerprint(refresh_token)),
            user_agent: Set(user_agent.map(str::to_owned)),
            expires_at: Set(expires_at.into()),
            revoked_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
    }

    /// The live session for a refresh token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_active_by_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<sessions::Model>, DbErr> {
        sessions::Entity::find()
            .filter(sessions::Column::RefreshTokenHash.eq(token_fingerprint(refresh_token)))
            .filter(sessions::Column::RevokedAt.is_null())
            .filter(sessions::Column::ExpiresAt.gt(Utc::now()))
            .one(&self.db)
            .await
    }

    /// Marks one session revoked. Already-revoked sessions are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke(&self, id: Uuid) -> Result<bool, DbErr> {
        let now = Utc::now();
        let result = sessions::Entity::update_many()
            .col_expr(sessions::Column::RevokedAt, Expr::value(now))
            .col_expr(sessions::Column::UpdatedAt, Expr::value(now))
            .filter(sessions::Column::Id.eq(id))
            .filter(sessions::Column::RevokedAt.is_null())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Revokes the live session of a refresh token. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke_by_token(&self, refresh_token: &str) -> Result<bool, DbErr> {
        let Some(session) = self.find_active_by_token(refresh_token).await? else {
            return Ok(false);
        };
        self.revoke(session.id).await
    }

    /// Revokes every live session of a user. Returns how many were revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke_all_user_sessions(&self, user_id: Uuid) -> Result<u64, DbErr> {
        let now = Utc::now();
        let result = sessions::Entity::update_many()
            .col_expr(sessions::Column::RevokedAt, Expr::value(now))
            .col_expr(sessions::Column::UpdatedAt, Expr::value(now))
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::RevokedAt.is_null())
            .exec(&self.db)
            .await?;

        debug!(user_id = %user_id, revoked = result.rows_affected, "Revoked user sessions");
        Ok(result.rows_affected)
    }

    /// Deletes sessions past their expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn cleanup_expired(&self) -> Result<u64, DbErr> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::ExpiresAt.lt(Utc::now()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable_hex() {
        let fingerprint = token_fingerprint("refresh-token");

        assert_eq!(fingerprint.len(), 64);
        assert!(fingerprint.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
        assert_eq!(fingerprint, token_fingerprint("refresh-token"));
        assert_ne!(fingerprint, token_fingerprint("refresh-token2"));
    }

    #[test]
    fn test_fingerprint_of_empty_token() {
        assert_eq!(
            token_fingerprint(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
