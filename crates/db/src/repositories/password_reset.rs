//! Password reset code repository.
//!
//! A code is issued, then either used once or left to expire.

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    sea_query::Expr,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entities::password_resets;

/// Password reset repository.
#[derive(Debug, Clone)]
pub struct PasswordResetRepository {
    db: DatabaseConnection,
}

impl PasswordResetRepository {
    /// Creates a new password reset repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Hashes a reset code for storage.
    #[must_use]
    pub fn hash_otp(otp: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(otp.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Generates a random six-digit code.
    #[must_use]
    pub fn generate_otp() -> String {
        let code: u32 = rand::random_range(100_000..1_000_000);
        code.to_string()
    }

    /// Issues a new code for a user, invalidating any unused earlier codes.
    /// Returns the raw code to be emailed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create_otp(&self, user_id: Uuid, ttl_minutes: i64) -> Result<String, DbErr> {
        self.invalidate_user_codes(user_id).await?;

        let otp = Self::generate_otp();
        let now = Utc::now();

        password_resets::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            otp_hash: Set(Self::hash_otp(&otp)),
            expires_at: Set((now + Duration::minutes(ttl_minutes)).into()),
            used_at: Set(None),
            created_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;

        Ok(otp)
    }

    /// Marks a matching live code as used. Returns `false` when no unused,
    /// unexpired code matches.
    ///
    /// The claim is a single conditional update, so a code can only be consumed once.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn consume(&self, user_id: Uuid, otp: &str) -> Result<bool, DbErr> {
        let now = Utc::now();

        let result = password_resets::Entity::update_many()
            .col_expr(password_resets::Column::UsedAt, Expr::value(now))
            .filter(password_resets::Column::UserId.eq(user_id))
            .filter(password_resets::Column::OtpHash.eq(Self::hash_otp(otp)))
            .filter(password_resets::Column::UsedAt.is_null())
            .filter(password_resets::Column::ExpiresAt.gt(now))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Invalidates all unused codes for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn invalidate_user_codes(&self, user_id: Uuid) -> Result<u64, DbErr> {
        let result = password_resets::Entity::update_many()
            .col_expr(password_resets::Column::UsedAt, Expr::value(Utc::now()))
            .filter(password_resets::Column::UserId.eq(user_id))
            .filter(password_resets::Column::UsedAt.is_null())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Deletes expired codes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn cleanup_expired(&self) -> Result<u64, DbErr> {
        let result = password_resets::Entity::delete_many()
            .filter(password_resets::Column::ExpiresAt.lt(Utc::now()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_otp_is_six_digits() {
        for _ in 0..100 {
            let otp = PasswordResetRepository::generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_hash_otp_is_deterministic() {
        assert_eq!(
            PasswordResetRepository::hash_otp("123456"),
            PasswordResetRepository::hash_otp("123456")
        );
        assert_ne!(
            PasswordResetRepository::hash_otp("123456"),
            PasswordResetRepository::hash_otp("654321")
        );
    }
}
