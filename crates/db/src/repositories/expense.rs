//! Expense repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    prelude::DateTimeWithTimeZone,
    sea_query::{Expr, Func, SimpleExpr},
};
use spendwise_core::reports::{MonthlyTotal, ReportService, TotalStats};
use spendwise_shared::types::PageRequest;
use uuid::Uuid;

use crate::entities::{categories, expenses};

/// Error types for expense operations.
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    /// Expense not found for this user.
    #[error("Expense not found: {0}")]
    NotFound(Uuid),

    /// Category missing or inactive.
    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseInput {
    /// Amount spent.
    pub amount: Decimal,
    /// Short description.
    pub description: String,
    /// Free-form notes.
    pub notes: Option<String>,
    /// When the expense happened; defaults to now.
    pub date: Option<DateTime<Utc>>,
    /// Category (must be active).
    pub category_id: Uuid,
}

/// Input for updating an expense.
#[derive(Debug, Clone, Default)]
pub struct UpdateExpenseInput {
    /// New amount.
    pub amount: Option<Decimal>,
    /// New description.
    pub description: Option<String>,
    /// New notes.
    pub notes: Option<String>,
    /// New date.
    pub date: Option<DateTime<Utc>>,
    /// New category (must be active).
    pub category_id: Option<Uuid>,
}

/// Filters for listing expenses.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    /// Only this category.
    pub category_id: Option<Uuid>,
    /// On or after.
    pub start: Option<DateTime<Utc>>,
    /// On or before.
    pub end: Option<DateTime<Utc>>,
    /// Case-insensitive match on description or notes.
    pub search: Option<String>,
}

/// Expense joined with its category.
#[derive(Debug, Clone)]
pub struct ExpenseWithCategory {
    /// Expense record.
    pub expense: expenses::Model,
    /// Category record.
    pub category: Option<categories::Model>,
}

impl From<(expenses::Model, Option<categories::Model>)> for ExpenseWithCategory {
    fn from((expense, category): (expenses::Model, Option<categories::Model>)) -> Self {
        Self { expense, category }
    }
}

/// Spending in one category.
#[derive(Debug, Clone)]
pub struct CategoryBreakdown {
    /// Category ID.
    pub category_id: Uuid,
    /// Category record.
    pub category: Option<categories::Model>,
    /// Sum of amounts.
    pub total_amount: Decimal,
    /// Number of expenses.
    pub count: u64,
}

/// Spending summary for a user.
#[derive(Debug, Clone)]
pub struct ExpenseStats {
    /// Totals over the window.
    pub totals: TotalStats,
    /// Totals per category.
    pub by_category: Vec<CategoryBreakdown>,
    /// Totals per month, newest first.
    pub monthly: Vec<MonthlyTotal>,
}

/// Account-wide figures for the profile page.
#[derive(Debug, Clone)]
pub struct UserExpenseStats {
    /// Number of expenses.
    pub total_expenses: u64,
    /// Sum of all expenses.
    pub total_amount: Decimal,
    /// Distinct categories used.
    pub categories_used: u64,
    /// Five most recently created expenses.
    pub recent_expenses: Vec<ExpenseWithCategory>,
}

/// `LOWER(col) LIKE '%needle%'`.
pub(crate) fn contains_ci<C: ColumnTrait>(column: C, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(format!("%{}%", needle.to_lowercase()))
}

pub(crate) fn count_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

/// Expense repository for CRUD and aggregate queries.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn filtered(user_id: Uuid, filter: &ExpenseFilter) -> Select<expenses::Entity> {
        let mut query = expenses::Entity::find().filter(expenses::Column::UserId.eq(user_id));

        if let Some(category_id) = filter.category_id {
            query = query.filter(expenses::Column::CategoryId.eq(category_id));
        }
        if let Some(start) = filter.start {
            query = query.filter(expenses::Column::Date.gte(start));
        }
        if let Some(end) = filter.end {
            query = query.filter(expenses::Column::Date.lte(end));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(expenses::Column::Description, search))
                    .add(contains_ci(expenses::Column::Notes, search)),
            );
        }

        query
    }

    async fn ensure_active_category(&self, category_id: Uuid) -> Result<(), ExpenseError> {
        categories::Entity::find_by_id(category_id)
            .filter(categories::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .map(|_| ())
            .ok_or(ExpenseError::CategoryNotFound(category_id))
    }

    /// Creates an expense.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseError::CategoryNotFound` if the category is missing or inactive.
    pub async fn create(
        &self,
        user_id: Uuid,
        input: CreateExpenseInput,
    ) -> Result<ExpenseWithCategory, ExpenseError> {
        self.ensure_active_category(input.category_id).await?;

        let now = Utc::now();
        let expense = expenses::ActiveModel {
            id: Set(Uuid::new_v4()),
            amount: Set(input.amount),
            description: Set(input.description),
            notes: Set(input.notes),
            date: Set(input.date.unwrap_or(now).into()),
            user_id: Set(user_id),
            category_id: Set(input.category_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;

        self.get(user_id, expense.id).await
    }

    /// Lists a page of expenses, newest first. Returns the page and the total count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: &ExpenseFilter,
        page: PageRequest,
    ) -> Result<(Vec<ExpenseWithCategory>, u64), DbErr> {
        let total = Self::filtered(user_id, filter).count(&self.db).await?;

        let rows = Self::filtered(user_id, filter)
            .find_also_related(categories::Entity)
            .order_by_desc(expenses::Column::Date)
            .offset(page.offset())
            .limit(page.limit)
            .all(&self.db)
            .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Gets one of the user's expenses.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseError::NotFound` if it does not exist or belongs to another user.
    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<ExpenseWithCategory, ExpenseError> {
        expenses::Entity::find_by_id(id)
            .filter(expenses::Column::UserId.eq(user_id))
            .find_also_related(categories::Entity)
            .one(&self.db)
            .await?
            .map(Into::into)
            .ok_or(ExpenseError::NotFound(id))
    }

    /// Updates one of the user's expenses.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseError::NotFound` or `ExpenseError::CategoryNotFound`.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: UpdateExpenseInput,
    ) -> Result<ExpenseWithCategory, ExpenseError> {
        let existing = self.get(user_id, id).await?.expense;

        if let Some(category_id) = input.category_id {
            self.ensure_active_category(category_id).await?;
        }

        let mut active: expenses::ActiveModel = existing.into();
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }
        if let Some(date) = input.date {
            active.date = Set(date.into());
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await?;

        self.get(user_id, id).await
    }

    /// Deletes one of the user's expenses.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseError::NotFound` if nothing was deleted.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), ExpenseError> {
        let result = expenses::Entity::delete_many()
            .filter(expenses::Column::Id.eq(id))
            .filter(expenses::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ExpenseError::NotFound(id));
        }
        Ok(())
    }

    /// Counts a user's expenses.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_for_user(&self, user_id: Uuid) -> Result<u64, DbErr> {
        expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id))
            .count(&self.db)
            .await
    }

    /// Amount and date of every expense of a user within `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn amounts_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end_exclusive: DateTime<Utc>,
    ) -> Result<Vec<expenses::Model>, DbErr> {
        expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id))
            .filter(expenses::Column::Date.gte(start))
            .filter(expenses::Column::Date.lt(end_exclusive))
            .all(&self.db)
            .await
    }

    /// Totals, per-category breakdown and monthly totals for a user.
    ///
    /// Monthly totals default to the twelve months up to now.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn stats(
        &self,
        user_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<ExpenseStats, DbErr> {
        let window = ExpenseFilter {
            start,
            end,
            ..ExpenseFilter::default()
        };

        let (sum, count) = Self::filtered(user_id, &window)
            .select_only()
            .column_as(expenses::Column::Amount.sum(), "sum")
            .column_as(expenses::Column::Id.count(), "count")
            .into_tuple::<(Option<Decimal>, i64)>()
            .one(&self.db)
            .await?
            .unwrap_or((None, 0));

        let grouped: Vec<(Uuid, Option<Decimal>, i64)> = Self::filtered(user_id, &window)
            .select_only()
            .column(expenses::Column::CategoryId)
            .column_as(expenses::Column::Amount.sum(), "sum")
            .column_as(expenses::Column::Id.count(), "count")
            .group_by(expenses::Column::CategoryId)
            .into_tuple()
            .all(&self.db)
            .await?;

        let category_ids: Vec<Uuid> = grouped.iter().map(|(id, _, _)| *id).collect();
        let category_rows = categories::Entity::find()
            .filter(categories::Column::Id.is_in(category_ids))
            .all(&self.db)
            .await?;

        let by_category = grouped
            .into_iter()
            .map(|(category_id, sum, count)| CategoryBreakdown {
                category_id,
                category: category_rows.iter().find(|c| c.id == category_id).cloned(),
                total_amount: sum.unwrap_or(Decimal::ZERO),
                count: count_u64(count),
            })
            .collect();

        let (month_start, month_end) = ReportService::monthly_window(Utc::now(), start, end);
        let monthly_rows: Vec<(DateTimeWithTimeZone, Decimal)> = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id))
            .filter(expenses::Column::Date.gte(month_start))
            .filter(expenses::Column::Date.lte(month_end))
            .select_only()
            .column(expenses::Column::Date)
            .column(expenses::Column::Amount)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(ExpenseStats {
            totals: ReportService::totals(sum, count_u64(count)),
            by_category,
            monthly: ReportService::monthly_totals(
                monthly_rows
                    .into_iter()
                    .map(|(date, amount)| (date.with_timezone(&Utc), amount)),
            ),
        })
    }

    /// Account-wide figures for the profile page.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn user_stats(&self, user_id: Uuid) -> Result<UserExpenseStats, DbErr> {
        let (sum, count) = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id))
            .select_only()
            .column_as(expenses::Column::Amount.sum(), "sum")
            .column_as(expenses::Column::Id.count(), "count")
            .into_tuple::<(Option<Decimal>, i64)>()
            .one(&self.db)
            .await?
            .unwrap_or((None, 0));

        let categories_used = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id))
            .select_only()
            .column(expenses::Column::CategoryId)
            .distinct()
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await?
            .len();

        let recent_expenses = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id))
            .find_also_related(categories::Entity)
            .order_by_desc(expenses::Column::CreatedAt)
            .limit(5)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(UserExpenseStats {
            total_expenses: count_u64(count),
            total_amount: sum.unwrap_or(Decimal::ZERO),
            categories_used: u64::try_from(categories_used).unwrap_or(0),
            recent_expenses,
        })
    }
}
