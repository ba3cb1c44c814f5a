//! Expense routes.

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::ApiResult,
    extractors::{DateInput, ValidatedJson, ValidatedQuery, validate_positive},
    middleware::AuthUser,
    response::{created, message, ok, ok_with_message},
    routes::categories::{CategorySummary, DateRangeQuery},
};
use spendwise_core::reports::{MonthlyTotal, TotalStats};
use spendwise_db::{
    ExpenseRepository,
    entities::expenses,
    repositories::{
        CategoryBreakdown, CreateExpenseInput, ExpenseFilter, ExpenseWithCategory,
        UpdateExpenseInput,
    },
};
use spendwise_shared::types::{PageMeta, PageRequest};

/// Creates the expense routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/stats", get(expense_stats))
        .route(
            "/expenses/{id}",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating an expense.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    /// Amount spent.
    #[validate(custom(function = "validate_positive"))]
    pub amount: Decimal,
    /// Description.
    #[validate(length(min = 1, max = 255, message = "Description is required"))]
    pub description: String,
    /// Notes.
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    /// When it happened; defaults to now.
    pub date: Option<DateInput>,
    /// Category ID.
    pub category_id: Uuid,
}

/// Request body for updating an expense.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseRequest {
    /// New amount.
    #[validate(custom(function = "validate_positive"))]
    pub amount: Option<Decimal>,
    /// New description.
    #[validate(length(min = 1, max = 255, message = "Description is required"))]
    pub description: Option<String>,
    /// New notes.
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    /// New date.
    pub date: Option<DateInput>,
    /// New category.
    pub category_id: Option<Uuid>,
}

/// Query for listing expenses.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListExpensesQuery {
    /// Page number, from 1.
    #[validate(range(min = 1))]
    pub page: Option<u64>,
    /// Page size.
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,
    /// Only this category.
    pub category_id: Option<Uuid>,
    /// On or after.
    pub start_date: Option<DateInput>,
    /// On or before.
    pub end_date: Option<DateInput>,
    /// Case-insensitive text search.
    #[validate(length(max = 255))]
    pub search: Option<String>,
}

impl ListExpensesQuery {
    fn page_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.limit.unwrap_or(defaults.limit),
        )
    }
}

/// Expense view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseResponse {
    /// Expense ID.
    pub id: Uuid,
    /// Amount.
    pub amount: Decimal,
    /// Description.
    pub description: String,
    /// Notes.
    pub notes: Option<String>,
    /// When it happened.
    pub date: DateTime<Utc>,
    /// Category ID.
    pub category_id: Uuid,
    /// Category summary, when loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategorySummary>,
    /// Created at timestamp.
    pub created_at: DateTime<Utc>,
    /// Updated at timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<expenses::Model> for ExpenseResponse {
    fn from(expense: expenses::Model) -> Self {
        Self {
            id: expense.id,
            amount: expense.amount,
            description: expense.description,
            notes: expense.notes,
            date: expense.date.with_timezone(&Utc),
            category_id: expense.category_id,
            category: None,
            created_at: expense.created_at.with_timezone(&Utc),
            updated_at: expense.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<ExpenseWithCategory> for ExpenseResponse {
    fn from(row: ExpenseWithCategory) -> Self {
        Self {
            category: row.category.map(CategorySummary::from),
            ..Self::from(row.expense)
        }
    }
}

/// A page of expenses.
#[derive(Debug, Serialize)]
pub struct ExpenseListResponse {
    /// Expenses on this page.
    pub expenses: Vec<ExpenseResponse>,
    /// Pagination details.
    pub pagination: PageMeta,
}

/// Spending in one category.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStatResponse {
    /// Category ID.
    pub category_id: Uuid,
    /// Category summary.
    pub category: Option<CategorySummary>,
    /// Sum of amounts.
    pub total_amount: Decimal,
    /// Number of expenses.
    pub count: u64,
}

impl From<CategoryBreakdown> for CategoryStatResponse {
    fn from(row: CategoryBreakdown) -> Self {
        Self {
            category_id: row.category_id,
            category: row.category.map(CategorySummary::from),
            total_amount: row.total_amount,
            count: row.count,
        }
    }
}

/// Spending summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseStatsResponse {
    /// Totals.
    pub total_stats: TotalStats,
    /// Per-category totals.
    pub category_stats: Vec<CategoryStatResponse>,
    /// Per-month totals, newest first.
    pub monthly_stats: Vec<MonthlyTotal>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /expenses - Record an expense.
async fn create_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateExpenseRequest>,
) -> ApiResult<impl IntoResponse> {
    let row = ExpenseRepository::new((*state.db).clone())
        .create(
            auth.id,
            CreateExpenseInput {
                amount: payload.amount,
                description: payload.description,
                notes: payload.notes,
                date: payload.date.map(DateInput::instant),
                category_id: payload.category_id,
            },
        )
        .await?;

    info!(user_id = %auth.id, expense_id = %row.expense.id, "Expense created");
    Ok(created(
        "Expense created successfully",
        json!({ "expense": ExpenseResponse::from(row) }),
    ))
}

/// GET /expenses - Paginated, filtered list.
async fn list_expenses(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<ListExpensesQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = query.page_request();
    let filter = ExpenseFilter {
        category_id: query.category_id,
        start: query.start_date.map(DateInput::instant),
        end: query.end_date.map(DateInput::instant),
        search: query.search,
    };

    let (rows, total) = ExpenseRepository::new((*state.db).clone())
        .list(auth.id, &filter, page)
        .await?;

    Ok(ok(ExpenseListResponse {
        expenses: rows.into_iter().map(ExpenseResponse::from).collect(),
        pagination: page.meta(total),
    }))
}

/// GET /expenses/{id} - One expense.
async fn get_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let row = ExpenseRepository::new((*state.db).clone())
        .get(auth.id, id)
        .await?;

    Ok(ok(json!({ "expense": ExpenseResponse::from(row) })))
}

/// PUT /expenses/{id} - Update an expense.
async fn update_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateExpenseRequest>,
) -> ApiResult<impl IntoResponse> {
    let row = ExpenseRepository::new((*state.db).clone())
        .update(
            auth.id,
            id,
            UpdateExpenseInput {
                amount: payload.amount,
                description: payload.description,
                notes: payload.notes,
                date: payload.date.map(DateInput::instant),
                category_id: payload.category_id,
            },
        )
        .await?;

    Ok(ok_with_message(
        "Expense updated successfully",
        json!({ "expense": ExpenseResponse::from(row) }),
    ))
}

/// DELETE /expenses/{id} - Delete an expense.
async fn delete_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ExpenseRepository::new((*state.db).clone())
        .delete(auth.id, id)
        .await?;

    info!(user_id = %auth.id, expense_id = %id, "Expense deleted");
    Ok(message("Expense deleted successfully"))
}

/// GET /expenses/stats - Totals, per-category and per-month figures.
async fn expense_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<DateRangeQuery>,
) -> ApiResult<impl IntoResponse> {
    let (start, end) = query.bounds();
    let stats = ExpenseRepository::new((*state.db).clone())
        .stats(auth.id, start, end)
        .await?;

    Ok(ok(ExpenseStatsResponse {
        total_stats: stats.totals,
        category_stats: stats
            .by_category
            .into_iter()
            .map(CategoryStatResponse::from)
            .collect(),
        monthly_stats: stats.monthly,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_request_parses_camel_case_and_dates() {
        let request: CreateExpenseRequest = serde_json::from_value(json!({
            "amount": 12.5,
            "description": "Lunch",
            "date": "2024-05-01",
            "categoryId": "00000000-0000-0000-0000-000000000001"
        }))
        .unwrap();

        assert_eq!(request.amount, dec!(12.5));
        assert!(request.validate().is_ok());
        assert_eq!(
            request.date.map(DateInput::instant).unwrap().to_rfc3339(),
            "2024-05-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_create_request_rejects_zero_amount() {
        let request: CreateExpenseRequest = serde_json::from_value(json!({
            "amount": "0",
            "description": "Nothing",
            "categoryId": "00000000-0000-0000-0000-000000000001"
        }))
        .unwrap();

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_list_query_defaults() {
        let query = ListExpensesQuery::default();
        let page = query.page_request();
        assert_eq!((page.page, page.limit), (1, 10));
    }

    #[test]
    fn test_list_query_limit_bounds() {
        let query = ListExpensesQuery {
            limit: Some(101),
            ..Default::default()
        };
        assert!(query.validate().is_err());
    }
}
