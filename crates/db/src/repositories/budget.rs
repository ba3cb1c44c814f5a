//! Budget repository.
//!
//! Spent amounts are never stored. Every read that needs them loads the user's
//! budgets and the expenses inside their combined window, then runs the
//! overlap accountant from `spendwise_core::budget`.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use spendwise_core::budget::{
    AlertSeverity, BudgetError as RuleError, BudgetProgress, BudgetService, BudgetWindow,
    ExpensePoint,
};
use spendwise_shared::types::{BudgetId, CategoryId};
use tracing::debug;
use uuid::Uuid;

use crate::entities::{budgets, categories, expenses};

/// Error types for budget operations.
#[derive(Debug, thiserror::Error)]
pub enum BudgetError {
    /// Budget not found for this user.
    #[error("Budget not found: {0}")]
    NotFound(Uuid),

    /// Referenced category does not exist.
    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),

    /// Amount or window rejected by validation.
    #[error(transparent)]
    Invalid(#[from] RuleError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a budget.
#[derive(Debug, Clone)]
pub struct CreateBudgetInput {
    /// Display name.
    pub name: String,
    /// Spending cap.
    pub amount: Decimal,
    /// First day (inclusive).
    pub start_date: NaiveDate,
    /// Last day (inclusive).
    pub end_date: NaiveDate,
    /// Category restriction; `None` is the uncategorized bucket.
    pub category_id: Option<Uuid>,
}

/// Input for updating a budget. Unset fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct UpdateBudgetInput {
    /// New name.
    pub name: Option<String>,
    /// New cap.
    pub amount: Option<Decimal>,
    /// New first day.
    pub start_date: Option<NaiveDate>,
    /// New last day.
    pub end_date: Option<NaiveDate>,
    /// `Some(None)` moves the budget to the uncategorized bucket.
    pub category_id: Option<Option<Uuid>>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// Budget joined with its category.
#[derive(Debug, Clone)]
pub struct BudgetRecord {
    /// Budget record.
    pub budget: budgets::Model,
    /// Category record, if the budget has one.
    pub category: Option<categories::Model>,
}

impl From<(budgets::Model, Option<categories::Model>)> for BudgetRecord {
    fn from((budget, category): (budgets::Model, Option<categories::Model>)) -> Self {
        Self { budget, category }
    }
}

/// Budget with its attributed spending.
#[derive(Debug, Clone)]
pub struct BudgetWithSpent {
    /// Budget and category.
    pub record: BudgetRecord,
    /// Amount attributed by the overlap accountant.
    pub spent: Decimal,
}

/// Budget with full progress figures.
#[derive(Debug, Clone)]
pub struct BudgetProgressReport {
    /// Budget and category.
    pub record: BudgetRecord,
    /// Derived figures.
    pub progress: BudgetProgress,
}

/// Budget at or past the alert threshold.
#[derive(Debug, Clone)]
pub struct BudgetAlert {
    /// Budget and category.
    pub record: BudgetRecord,
    /// Derived figures.
    pub progress: BudgetProgress,
    /// Alert tier.
    pub severity: AlertSeverity,
}

/// Projects a stored budget onto the accountant's view.
#[must_use]
pub fn to_window(budget: &budgets::Model) -> BudgetWindow {
    BudgetWindow {
        id: BudgetId::from_uuid(budget.id),
        amount: budget.amount,
        start_date: budget.start_date,
        end_date: budget.end_date,
        category_id: budget.category_id.map(CategoryId::from_uuid),
    }
}

/// Projects a stored expense onto the accountant's view, keyed by its UTC calendar date.
#[must_use]
pub fn to_point(expense: &expenses::Model) -> ExpensePoint {
    ExpensePoint {
        amount: expense.amount,
        date: expense.date.with_timezone(&Utc).date_naive(),
        category_id: CategoryId::from_uuid(expense.category_id),
    }
}

/// Instant range `[start, end)` covering every well-formed window, or `None` if there is none.
#[must_use]
pub fn expense_window(windows: &[BudgetWindow]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let well_formed = || windows.iter().filter(|w| w.is_well_formed());
    let start = well_formed().map(|w| w.start_date).min()?;
    let end = well_formed().map(|w| w.end_date).max()?;

    let start = start.and_time(NaiveTime::MIN).and_utc();
    let end = end
        .checked_add_days(Days::new(1))
        .map_or(DateTime::<Utc>::MAX_UTC, |d| d.and_time(NaiveTime::MIN).and_utc());
    Some((start, end))
}

/// Budget repository.
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    db: DatabaseConnection,
}

impl BudgetRepository {
    /// Creates a new budget repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn ensure_category(&self, category_id: Uuid) -> Result<(), BudgetError> {
        categories::Entity::find_by_id(category_id)
            .one(&self.db)
            .await?
            .map(|_| ())
            .ok_or(BudgetError::CategoryNotFound(category_id))
    }

    /// Every budget the user owns, newest first.
    async fn all_for_user(&self, user_id: Uuid) -> Result<Vec<BudgetRecord>, DbErr> {
        Ok(budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .find_also_related(categories::Entity)
            .order_by_desc(budgets::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Loads the accountant's inputs for a user: all windows and every expense inside them.
    async fn accounting_inputs(
        &self,
        user_id: Uuid,
        records: &[BudgetRecord],
    ) -> Result<(Vec<BudgetWindow>, Vec<ExpensePoint>), DbErr> {
        let windows: Vec<BudgetWindow> = records.iter().map(|r| to_window(&r.budget)).collect();

        let pool = match expense_window(&windows) {
            Some((start, end)) => expenses::Entity::find()
                .filter(expenses::Column::UserId.eq(user_id))
                .filter(expenses::Column::Date.gte(start))
                .filter(expenses::Column::Date.lt(end))
                .all(&self.db)
                .await?
                .iter()
                .map(to_point)
                .collect(),
            None => Vec::new(),
        };

        debug!(
            user_id = %user_id,
            budgets = windows.len(),
            expenses = pool.len(),
            "Loaded budget accounting inputs"
        );
        Ok((windows, pool))
    }

    /// Creates a budget.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::Invalid` for a non-positive amount or inverted window,
    /// `BudgetError::CategoryNotFound` for an unknown category.
    pub async fn create(
        &self,
        user_id: Uuid,
        input: CreateBudgetInput,
    ) -> Result<BudgetRecord, BudgetError> {
        BudgetService::validate(input.amount, input.start_date, input.end_date)?;
        if let Some(category_id) = input.category_id {
            self.ensure_category(category_id).await?;
        }

        let now = Utc::now();
        let budget = budgets::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            amount: Set(input.amount),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            is_active: Set(true),
            user_id: Set(user_id),
            category_id: Set(input.category_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;

        self.get(user_id, budget.id).await
    }

    /// Gets one of the user's budgets.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NotFound` if it does not exist or belongs to another user.
    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<BudgetRecord, BudgetError> {
        budgets::Entity::find_by_id(id)
            .filter(budgets::Column::UserId.eq(user_id))
            .find_also_related(categories::Entity)
            .one(&self.db)
            .await?
            .map(Into::into)
            .ok_or(BudgetError::NotFound(id))
    }

    /// Lists budgets with their spent amounts.
    ///
    /// Spending is attributed against all of the user's budgets; `is_active`
    /// only filters which ones are returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_with_spent(
        &self,
        user_id: Uuid,
        is_active: Option<bool>,
    ) -> Result<Vec<BudgetWithSpent>, DbErr> {
        let records = self.all_for_user(user_id).await?;
        let (windows, pool) = self.accounting_inputs(user_id, &records).await?;

        Ok(records
            .into_iter()
            .zip(windows.iter())
            .filter(|(record, _)| is_active.is_none_or(|flag| record.budget.is_active == flag))
            .map(|(record, window)| BudgetWithSpent {
                spent: BudgetService::spent_from_pool(window, &windows, &pool),
                record,
            })
            .collect())
    }

    /// Spent, remaining and percentage for one budget.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NotFound` if it does not exist or belongs to another user.
    pub async fn progress(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<BudgetProgressReport, BudgetError> {
        let records = self.all_for_user(user_id).await?;
        let (windows, pool) = self.accounting_inputs(user_id, &records).await?;

        let (record, window) = records
            .into_iter()
            .zip(windows.iter())
            .find(|(record, _)| record.budget.id == id)
            .ok_or(BudgetError::NotFound(id))?;

        let spent = BudgetService::spent_from_pool(window, &windows, &pool);
        Ok(BudgetProgressReport {
            progress: BudgetService::progress(record.budget.amount, spent),
            record,
        })
    }

    /// Active budgets whose window contains `today` and that have reached an alert tier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn alerts(&self, user_id: Uuid, today: NaiveDate) -> Result<Vec<BudgetAlert>, DbErr> {
        let records = self.all_for_user(user_id).await?;
        let (windows, pool) = self.accounting_inputs(user_id, &records).await?;

        Ok(records
            .into_iter()
            .zip(windows.iter())
            .filter(|(record, window)| record.budget.is_active && window.covers(today))
            .filter_map(|(record, window)| {
                let spent = BudgetService::spent_from_pool(window, &windows, &pool);
                let severity = BudgetService::alert_severity(record.budget.amount, spent)?;
                Some(BudgetAlert {
                    progress: BudgetService::progress(record.budget.amount, spent),
                    severity,
                    record,
                })
            })
            .collect())
    }

    /// Updates one of the user's budgets.
    ///
    /// The merged window is validated, so moving only one end cannot invert it.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NotFound`, `BudgetError::CategoryNotFound` or
    /// `BudgetError::Invalid`.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: UpdateBudgetInput,
    ) -> Result<BudgetRecord, BudgetError> {
        let existing = self.get(user_id, id).await?.budget;

        let amount = input.amount.unwrap_or(existing.amount);
        let start_date = input.start_date.unwrap_or(existing.start_date);
        let end_date = input.end_date.unwrap_or(existing.end_date);
        BudgetService::validate(amount, start_date, end_date)?;

        if let Some(Some(category_id)) = input.category_id {
            self.ensure_category(category_id).await?;
        }

        let mut active: budgets::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        active.amount = Set(amount);
        active.start_date = Set(start_date);
        active.end_date = Set(end_date);
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await?;

        self.get(user_id, id).await
    }

    /// Deletes one of the user's budgets.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NotFound` if nothing was deleted.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), BudgetError> {
        let result = budgets::Entity::delete_many()
            .filter(budgets::Column::Id.eq(id))
            .filter(budgets::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(BudgetError::NotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "budget_tests.rs"]
mod tests;
