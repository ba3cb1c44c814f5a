//! Budget routes.
//!
//! Spent amounts come from the overlap accountant on every read; see
//! `spendwise_core::budget`.

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::ApiResult,
    extractors::{DateInput, ValidatedJson, ValidatedQuery, validate_positive},
    middleware::AuthUser,
    response::{created, message, ok, ok_with_message},
    routes::categories::CategorySummary,
};
use spendwise_core::budget::{AlertSeverity, BudgetProgress};
use spendwise_db::{
    BudgetRepository,
    repositories::{
        BudgetAlert, BudgetProgressReport, BudgetRecord, BudgetWithSpent, CreateBudgetInput,
        UpdateBudgetInput,
    },
};

/// Creates the budget routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budget", get(list_budgets).post(create_budget))
        .route("/budget/alerts", get(budget_alerts))
        .route(
            "/budget/{id}",
            get(get_budget).put(update_budget).delete(delete_budget),
        )
        .route("/budget/{id}/progress", get(budget_progress))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a budget.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBudgetRequest {
    /// Budget name.
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    /// Spending cap.
    #[validate(custom(function = "validate_positive"))]
    pub amount: Decimal,
    /// First day.
    pub start_date: DateInput,
    /// Last day.
    pub end_date: DateInput,
    /// Category restriction.
    pub category_id: Option<Uuid>,
}

/// Request body for updating a budget.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBudgetRequest {
    /// New name.
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: Option<String>,
    /// New cap.
    #[validate(custom(function = "validate_positive"))]
    pub amount: Option<Decimal>,
    /// New first day.
    pub start_date: Option<DateInput>,
    /// New last day.
    pub end_date: Option<DateInput>,
    /// Absent keeps the category, `null` clears it.
    #[serde(default, deserialize_with = "present")]
    pub category_id: Option<Option<Uuid>>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// Marks a present field as `Some`, including an explicit `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Query for listing budgets.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListBudgetsQuery {
    /// Only active or only inactive budgets.
    pub is_active: Option<bool>,
}

/// Budget view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetResponse {
    /// Budget ID.
    pub id: Uuid,
    /// Name.
    pub name: String,
    /// Cap.
    pub amount: Decimal,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Whether the budget is active.
    pub is_active: bool,
    /// Category restriction.
    pub category_id: Option<Uuid>,
    /// Category summary.
    pub category: Option<CategorySummary>,
    /// Attributed spending, on listings.
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub spent: Option<Decimal>,
    /// Created at timestamp.
    pub created_at: DateTime<Utc>,
    /// Updated at timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<BudgetRecord> for BudgetResponse {
    fn from(BudgetRecord { budget, category }: BudgetRecord) -> Self {
        Self {
            id: budget.id,
            name: budget.name,
            amount: budget.amount,
            start_date: budget.start_date,
            end_date: budget.end_date,
            is_active: budget.is_active,
            category_id: budget.category_id,
            category: category.map(CategorySummary::from),
            spent: None,
            created_at: budget.created_at.with_timezone(&Utc),
            updated_at: budget.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<BudgetWithSpent> for BudgetResponse {
    fn from(row: BudgetWithSpent) -> Self {
        Self {
            spent: Some(row.spent),
            ..Self::from(row.record)
        }
    }
}

/// A budget with its progress figures.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProgressResponse {
    /// The budget.
    pub budget: BudgetResponse,
    /// Spent, remaining, percentage and over-budget flag.
    #[serde(flatten)]
    pub progress: BudgetProgress,
}

impl From<BudgetProgressReport> for BudgetProgressResponse {
    fn from(report: BudgetProgressReport) -> Self {
        Self {
            budget: report.record.into(),
            progress: report.progress,
        }
    }
}

/// A budget that reached an alert tier.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAlertResponse {
    /// The budget.
    pub budget: BudgetResponse,
    /// Progress figures.
    #[serde(flatten)]
    pub progress: BudgetProgress,
    /// Alert tier.
    pub severity: AlertSeverity,
}

impl From<BudgetAlert> for BudgetAlertResponse {
    fn from(alert: BudgetAlert) -> Self {
        Self {
            budget: alert.record.into(),
            progress: alert.progress,
            severity: alert.severity,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /budget - Create a budget.
async fn create_budget(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateBudgetRequest>,
) -> ApiResult<impl IntoResponse> {
    let record = BudgetRepository::new((*state.db).clone())
        .create(
            auth.id,
            CreateBudgetInput {
                name: payload.name.trim().to_string(),
                amount: payload.amount,
                start_date: payload.start_date.date(),
                end_date: payload.end_date.date(),
                category_id: payload.category_id,
            },
        )
        .await?;

    info!(user_id = %auth.id, budget_id = %record.budget.id, "Budget created");
    Ok(created(
        "Budget created successfully",
        BudgetResponse::from(record),
    ))
}

/// GET /budget - Budgets with their spent amounts.
async fn list_budgets(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<ListBudgetsQuery>,
) -> ApiResult<impl IntoResponse> {
    let rows = BudgetRepository::new((*state.db).clone())
        .list_with_spent(auth.id, query.is_active)
        .await?;

    Ok(ok(rows
        .into_iter()
        .map(BudgetResponse::from)
        .collect::<Vec<_>>()))
}

/// GET /budget/{id} - One budget.
async fn get_budget(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let record = BudgetRepository::new((*state.db).clone())
        .get(auth.id, id)
        .await?;

    Ok(ok(BudgetResponse::from(record)))
}

/// PUT /budget/{id} - Update a budget.
async fn update_budget(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateBudgetRequest>,
) -> ApiResult<impl IntoResponse> {
    let record = BudgetRepository::new((*state.db).clone())
        .update(
            auth.id,
            id,
            UpdateBudgetInput {
                name: payload.name.map(|name| name.trim().to_string()),
                amount: payload.amount,
                start_date: payload.start_date.map(DateInput::date),
                end_date: payload.end_date.map(DateInput::date),
                category_id: payload.category_id,
                is_active: payload.is_active,
            },
        )
        .await?;

    Ok(ok_with_message(
        "Budget updated successfully",
        BudgetResponse::from(record),
    ))
}

/// DELETE /budget/{id} - Delete a budget.
async fn delete_budget(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    BudgetRepository::new((*state.db).clone())
        .delete(auth.id, id)
        .await?;

    info!(user_id = %auth.id, budget_id = %id, "Budget deleted");
    Ok(message("Budget deleted successfully"))
}

/// GET /budget/{id}/progress - Spent, remaining and percentage used.
async fn budget_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let report = BudgetRepository::new((*state.db).clone())
        .progress(auth.id, id)
        .await?;

    Ok(ok(BudgetProgressResponse::from(report)))
}

/// GET /budget/alerts - Current budgets at 80% or more.
async fn budget_alerts(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let today = Utc::now().date_naive();
    let alerts = BudgetRepository::new((*state.db).clone())
        .alerts(auth.id, today)
        .await?;

    Ok(ok(alerts
        .into_iter()
        .map(BudgetAlertResponse::from)
        .collect::<Vec<_>>()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use spendwise_db::entities::budgets;

    fn record() -> BudgetRecord {
        let at = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
        BudgetRecord {
            budget: budgets::Model {
                id: Uuid::nil(),
                name: "Groceries".to_string(),
                amount: dec!(100),
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
                is_active: true,
                user_id: Uuid::nil(),
                category_id: None,
                created_at: at,
                updated_at: at,
            },
            category: None,
        }
    }

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let absent: UpdateBudgetRequest = serde_json::from_value(json!({})).unwrap();
        let cleared: UpdateBudgetRequest =
            serde_json::from_value(json!({"categoryId": null})).unwrap();

        assert_eq!(absent.category_id, None);
        assert_eq!(cleared.category_id, Some(None));
    }

    #[test]
    fn test_create_request_accepts_both_date_formats() {
        let request: CreateBudgetRequest = serde_json::from_value(json!({
            "name": "Trip",
            "amount": "500",
            "startDate": "2024-03-01",
            "endDate": "2024-03-31T23:59:59.999Z"
        }))
        .unwrap();

        assert_eq!(request.start_date.date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(request.end_date.date(), NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
    }

    #[test]
    fn test_listing_includes_spent() {
        let body = serde_json::to_value(BudgetResponse::from(BudgetWithSpent {
            record: record(),
            spent: dec!(42.50),
        }))
        .unwrap();

        assert_eq!(body["spent"], json!(42.5));
        assert_eq!(body["startDate"], json!("2024-01-01"));
    }

    #[test]
    fn test_alert_flattens_progress() {
        let body = serde_json::to_value(BudgetAlertResponse::from(BudgetAlert {
            record: record(),
            progress: BudgetProgress {
                spent_amount: dec!(95),
                remaining_amount: dec!(5),
                percentage_used: dec!(95),
                is_over_budget: false,
            },
            severity: AlertSeverity::Warning,
        }))
        .unwrap();

        assert_eq!(body["severity"], json!("warning"));
        assert_eq!(body["percentageUsed"], json!(95.0));
        assert_eq!(body["remainingAmount"], json!(5.0));
        assert_eq!(body["budget"]["name"], json!("Groceries"));
        assert!(body["budget"].get("spent").is_none());
    }
}
