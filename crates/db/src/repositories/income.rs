//! Income repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    sea_query::{Alias, Expr},
};
use spendwise_core::reports::{ReportService, TotalStats};
use spendwise_shared::types::PageRequest;
use uuid::Uuid;

use super::expense::{contains_ci, count_u64};
use crate::entities::incomes;

/// Error types for income operations.
#[derive(Debug, thiserror::Error)]
pub enum IncomeError {
    /// Income not found for this user.
    #[error("Income not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for recording income.
#[derive(Debug, Clone)]
pub struct CreateIncomeInput {
    /// Amount received.
    pub amount: Decimal,
    /// Short description.
    pub description: String,
    /// Where the money came from.
    pub source: String,
    /// When it was received; defaults to now.
    pub date: Option<DateTime<Utc>>,
}

/// Input for updating income.
#[derive(Debug, Clone, Default)]
pub struct UpdateIncomeInput {
    /// New amount.
    pub amount: Option<Decimal>,
    /// New description.
    pub description: Option<String>,
    /// New source.
    pub source: Option<String>,
    /// New date.
    pub date: Option<DateTime<Utc>>,
}

/// Filters for listing income.
#[derive(Debug, Clone, Default)]
pub struct IncomeFilter {
    /// On or after.
    pub start: Option<DateTime<Utc>>,
    /// On or before.
    pub end: Option<DateTime<Utc>>,
    /// Case-insensitive match on description or source.
    pub search: Option<String>,
}

/// Income received from one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTotal {
    /// Source name.
    pub source: String,
    /// Sum of amounts.
    pub total_amount: Decimal,
    /// Number of entries.
    pub count: u64,
}

/// Income summary for a user.
#[derive(Debug, Clone)]
pub struct IncomeStats {
    /// Totals over the window.
    pub totals: TotalStats,
    /// Totals per source, largest first.
    pub by_source: Vec<SourceTotal>,
}

/// Income repository.
#[derive(Debug, Clone)]
pub struct IncomeRepository {
    db: DatabaseConnection,
}

impl IncomeRepository {
    /// Creates a new income repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn filtered(user_id: Uuid, filter: &IncomeFilter) -> Select<incomes::Entity> {
        let mut query = incomes::Entity::find().filter(incomes::Column::UserId.eq(user_id));

        if let Some(start) = filter.start {
            query = query.filter(incomes::Column::Date.gte(start));
        }
        if let Some(end) = filter.end {
            query = query.filter(incomes::Column::Date.lte(end));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(incomes::Column::Description, search))
                    .add(contains_ci(incomes::Column::Source, search)),
            );
        }

        query
    }

    /// Records income.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(
        &self,
        user_id: Uuid,
        input: CreateIncomeInput,
    ) -> Result<incomes::Model, IncomeError> {
        let now = Utc::now();
        let income = incomes::ActiveModel {
            id: Set(Uuid::new_v4()),
            amount: Set(input.amount),
            description: Set(input.description),
            source: Set(input.source),
            date: Set(input.date.unwrap_or(now).into()),
            user_id: Set(user_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;

        Ok(income)
    }

    /// Lists a page of income, newest first. Returns the page and the total count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: &IncomeFilter,
        page: PageRequest,
    ) -> Result<(Vec<incomes::Model>, u64), DbErr> {
        let total = Self::filtered(user_id, filter).count(&self.db).await?;
        let rows = Self::filtered(user_id, filter)
            .order_by_desc(incomes::Column::Date)
            .offset(page.offset())
            .limit(page.limit)
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// Gets one of the user's income entries.
    ///
    /// # Errors
    ///
    /// Returns `IncomeError::NotFound` if it does not exist or belongs to another user.
    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<incomes::Model, IncomeError> {
        incomes::Entity::find_by_id(id)
            .filter(incomes::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(IncomeError::NotFound(id))
    }

    /// Updates one of the user's income entries.
    ///
    /// # Errors
    ///
    /// Returns `IncomeError::NotFound` if it does not exist or belongs to another user.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: UpdateIncomeInput,
    ) -> Result<incomes::Model, IncomeError> {
        let mut active: incomes::ActiveModel = self.get(user_id, id).await?.into();

        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(source) = input.source {
            active.source = Set(source);
        }
        if let Some(date) = input.date {
            active.date = Set(date.into());
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes one of the user's income entries.
    ///
    /// # Errors
    ///
    /// Returns `IncomeError::NotFound` if nothing was deleted.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), IncomeError> {
        let result = incomes::Entity::delete_many()
            .filter(incomes::Column::Id.eq(id))
            .filter(incomes::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(IncomeError::NotFound(id));
        }
        Ok(())
    }

    /// Totals and per-source breakdown over an optional window.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn stats(
        &self,
        user_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<IncomeStats, DbErr> {
        let window = IncomeFilter {
            start,
            end,
            search: None,
        };

        let (sum, count) = Self::filtered(user_id, &window)
            .select_only()
            .column_as(incomes::Column::Amount.sum(), "sum")
            .column_as(incomes::Column::Id.count(), "count")
            .into_tuple::<(Option<Decimal>, i64)>()
            .one(&self.db)
            .await?
            .unwrap_or((None, 0));

        let by_source = Self::filtered(user_id, &window)
            .select_only()
            .column(incomes::Column::Source)
            .column_as(incomes::Column::Amount.sum(), "sum")
            .column_as(incomes::Column::Id.count(), "count")
            .group_by(incomes::Column::Source)
            .order_by(Expr::col(Alias::new("sum")), Order::Desc)
            .into_tuple::<(String, Option<Decimal>, i64)>()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|(source, sum, count)| SourceTotal {
                source,
                total_amount: sum.unwrap_or(Decimal::ZERO),
                count: count_u64(count),
            })
            .collect();

        Ok(IncomeStats {
            totals: ReportService::totals(sum, count_u64(count)),
            by_source,
        })
    }
}
