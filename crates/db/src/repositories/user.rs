//! User repository for database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::users;

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// User not found.
    #[error("User not found: {0}")]
    NotFound(Uuid),

    /// Another account already uses the email.
    #[error("Email is already taken")]
    EmailTaken,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for updating a user profile. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileInput {
    /// New display name.
    pub name: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New avatar URL.
    pub avatar: Option<String>,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds a user by ID, ignoring deactivated accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_active_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id)
            .filter(users::Column::IsActive.eq(true))
            .one(&self.db)
            .await
    }

    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns `UserError::EmailTaken` if the email is registered, or a database error.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<users::Model, UserError> {
        if self.email_exists(email).await? {
            return Err(UserError::EmailTaken);
        }

        let now = Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            name: Set(name.to_string()),
            avatar: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(user.insert(&self.db).await?)
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Updates profile fields.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotFound` for an unknown user and `UserError::EmailTaken`
    /// if the new email belongs to another account.
    pub async fn update_profile(
        &self,
        id: Uuid,
        input: UpdateProfileInput,
    ) -> Result<users::Model, UserError> {
        let user = self.find_by_id(id).await?.ok_or(UserError::NotFound(id))?;

        if let Some(email) = &input.email {
            let taken = users::Entity::find()
                .filter(users::Column::Email.eq(email.as_str()))
                .filter(users::Column::Id.ne(id))
                .count(&self.db)
                .await?;
            if taken > 0 {
                return Err(UserError::EmailTaken);
            }
        }

        let mut active: users::ActiveModel = user.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(avatar) = input.avatar {
            active.avatar = Set(Some(avatar));
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Replaces the stored password hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), DbErr> {
        users::ActiveModel {
            id: Set(id),
            password_hash: Set(password_hash.to_string()),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(())
    }

    /// Soft-deletes an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn deactivate(&self, id: Uuid) -> Result<(), DbErr> {
        users::ActiveModel {
            id: Set(id),
            is_active: Set(false),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(())
    }
}
