//! Category repository.
//!
//! Categories form a single catalogue shared by all users.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use spendwise_core::reports::{ReportService, TotalStats};
use uuid::Uuid;

use crate::entities::{categories, expenses};

/// Color given to categories created without one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#1890ff";

/// Error types for category operations.
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    /// Category not found.
    #[error("Category not found: {0}")]
    NotFound(Uuid),

    /// Another category already has the name.
    #[error("Category with this name already exists")]
    DuplicateName,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    /// Unique name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// `#RRGGBB`; defaults to [`DEFAULT_CATEGORY_COLOR`].
    pub color: Option<String>,
}

/// Input for updating a category.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New color.
    pub color: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// Category with the number of expenses filed under it.
#[derive(Debug, Clone)]
pub struct CategoryWithCount {
    /// Category record.
    pub category: categories::Model,
    /// Expenses referencing the category, across all users.
    pub expense_count: u64,
}

/// What a delete request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Expenses reference the category; it was deactivated instead.
    Deactivated,
    /// Row removed.
    Deleted,
}

/// Per-category figures for one user.
#[derive(Debug, Clone)]
pub struct CategoryStats {
    /// Category record.
    pub category: categories::Model,
    /// Totals over the requested window.
    pub stats: TotalStats,
    /// Ten most recent expenses in the category.
    pub recent_expenses: Vec<expenses::Model>,
}

/// Category repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn name_taken(&self, name: &str) -> Result<bool, DbErr> {
        let count = categories::Entity::find()
            .filter(categories::Column::Name.eq(name))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn expense_count(&self, id: Uuid) -> Result<u64, DbErr> {
        expenses::Entity::find()
            .filter(expenses::Column::CategoryId.eq(id))
            .count(&self.db)
            .await
    }

    /// Creates a category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::DuplicateName` if the name is in use.
    pub async fn create(
        &self,
        input: CreateCategoryInput,
    ) -> Result<categories::Model, CategoryError> {
        if self.name_taken(&input.name).await? {
            return Err(CategoryError::DuplicateName);
        }

        let now = Utc::now().into();
        let category = categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            color: Set(input
                .color
                .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string())),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(category.insert(&self.db).await?)
    }

    /// Lists categories ordered by name, with expense counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, include_inactive: bool) -> Result<Vec<CategoryWithCount>, DbErr> {
        let mut query = categories::Entity::find().order_by_asc(categories::Column::Name);
        if !include_inactive {
            query = query.filter(categories::Column::IsActive.eq(true));
        }
        let rows = query.all(&self.db).await?;

        let counts: HashMap<Uuid, i64> = expenses::Entity::find()
            .select_only()
            .column(expenses::Column::CategoryId)
            .column_as(expenses::Column::Id.count(), "count")
            .group_by(expenses::Column::CategoryId)
            .into_tuple::<(Uuid, i64)>()
            .all(&self.db)
            .await?
            .into_iter()
            .collect();

        Ok(rows
            .into_iter()
            .map(|category| {
                let expense_count = counts
                    .get(&category.id)
                    .map_or(0, |c| u64::try_from(*c).unwrap_or(0));
                CategoryWithCount {
                    category,
                    expense_count,
                }
            })
            .collect())
    }

    /// Finds a category by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<categories::Model>, DbErr> {
        categories::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds an active category by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_active(&self, id: Uuid) -> Result<Option<categories::Model>, DbErr> {
        categories::Entity::find_by_id(id)
            .filter(categories::Column::IsActive.eq(true))
            .one(&self.db)
            .await
    }

    /// Gets a category with its expense count.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::NotFound` for an unknown ID.
    pub async fn get_with_count(&self, id: Uuid) -> Result<CategoryWithCount, CategoryError> {
        let category = self
            .find_by_id(id)
            .await?
            .ok_or(CategoryError::NotFound(id))?;
        let expense_count = self.expense_count(id).await?;

        Ok(CategoryWithCount {
            category,
            expense_count,
        })
    }

    /// Updates a category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::NotFound` for an unknown ID and
    /// `CategoryError::DuplicateName` when renaming onto an existing name.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<CategoryWithCount, CategoryError> {
        let category = self
            .find_by_id(id)
            .await?
            .ok_or(CategoryError::NotFound(id))?;

        if let Some(name) = &input.name {
            if *name != category.name && self.name_taken(name).await? {
                return Err(CategoryError::DuplicateName);
            }
        }

        let mut active: categories::ActiveModel = category.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(color) = input.color {
            active.color = Set(color);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());

        let category = active.update(&self.db).await?;
        let expense_count = self.expense_count(id).await?;

        Ok(CategoryWithCount {
            category,
            expense_count,
        })
    }

    /// Deletes a category, or deactivates it while expenses still reference it.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::NotFound` for an unknown ID.
    pub async fn delete(&self, id: Uuid) -> Result<DeleteOutcome, CategoryError> {
        let category = self
            .find_by_id(id)
            .await?
            .ok_or(CategoryError::NotFound(id))?;

        if self.expense_count(id).await? > 0 {
            let mut active: categories::ActiveModel = category.into();
            active.is_active = Set(false);
            active.updated_at = Set(Utc::now().into());
            active.update(&self.db).await?;
            return Ok(DeleteOutcome::Deactivated);
        }

        categories::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(DeleteOutcome::Deleted)
    }

    /// Totals and recent expenses of one user within a category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::NotFound` for an unknown ID.
    pub async fn stats(
        &self,
        id: Uuid,
        user_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<CategoryStats, CategoryError> {
        let category = self
            .find_by_id(id)
            .await?
            .ok_or(CategoryError::NotFound(id))?;

        let mut query = expenses::Entity::find()
            .filter(expenses::Column::CategoryId.eq(id))
            .filter(expenses::Column::UserId.eq(user_id));
        if let Some(start) = start {
            query = query.filter(expenses::Column::Date.gte(start));
        }
        if let Some(end) = end {
            query = query.filter(expenses::Column::Date.lte(end));
        }

        let (sum, count) = query
            .select_only()
            .column_as(expenses::Column::Amount.sum(), "sum")
            .column_as(expenses::Column::Id.count(), "count")
            .into_tuple::<(Option<Decimal>, i64)>()
            .one(&self.db)
            .await?
            .unwrap_or((None, 0));

        let recent_expenses = expenses::Entity::find()
            .filter(expenses::Column::CategoryId.eq(id))
            .filter(expenses::Column::UserId.eq(user_id))
            .order_by_desc(expenses::Column::Date)
            .limit(10)
            .all(&self.db)
            .await?;

        Ok(CategoryStats {
            category,
            stats: ReportService::totals(sum, u64::try_from(count).unwrap_or(0)),
            recent_expenses,
        })
    }
}
