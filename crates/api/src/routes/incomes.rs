//! Income routes.

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::ApiResult,
    extractors::{DateInput, ValidatedJson, ValidatedQuery, validate_positive},
    middleware::AuthUser,
    response::{created, message, ok, ok_with_message},
    routes::categories::DateRangeQuery,
};
use spendwise_db::{
    IncomeRepository,
    entities::incomes,
    repositories::{CreateIncomeInput, IncomeFilter, SourceTotal, UpdateIncomeInput},
};
use spendwise_shared::types::PageRequest;

/// Creates the income routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/income", get(list_income).post(create_income))
        .route("/income/stats", get(income_stats))
        .route(
            "/income/{id}",
            get(get_income).put(update_income).delete(delete_income),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for recording income.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateIncomeRequest {
    /// Amount received.
    #[validate(custom(function = "validate_positive"))]
    pub amount: Decimal,
    /// Description.
    #[validate(length(min = 1, max = 255, message = "Description is required"))]
    pub description: String,
    /// Where it came from.
    #[validate(length(min = 1, max = 100, message = "Source is required"))]
    pub source: String,
    /// When it arrived; defaults to now.
    pub date: Option<DateInput>,
}

/// Request body for updating income.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateIncomeRequest {
    /// New amount.
    #[validate(custom(function = "validate_positive"))]
    pub amount: Option<Decimal>,
    /// New description.
    #[validate(length(min = 1, max = 255, message = "Description is required"))]
    pub description: Option<String>,
    /// New source.
    #[validate(length(min = 1, max = 100, message = "Source is required"))]
    pub source: Option<String>,
    /// New date.
    pub date: Option<DateInput>,
}

/// Query for listing income.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListIncomeQuery {
    /// Page number, from 1.
    #[validate(range(min = 1))]
    pub page: Option<u64>,
    /// Page size.
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,
    /// On or after.
    pub start_date: Option<DateInput>,
    /// On or before.
    pub end_date: Option<DateInput>,
    /// Case-insensitive search over description and source.
    #[validate(length(max = 255))]
    pub search: Option<String>,
}

/// Income view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeResponse {
    /// Income ID.
    pub id: Uuid,
    /// Amount.
    pub amount: Decimal,
    /// Description.
    pub description: String,
    /// Source.
    pub source: String,
    /// When it arrived.
    pub date: DateTime<Utc>,
    /// Created at timestamp.
    pub created_at: DateTime<Utc>,
    /// Updated at timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<incomes::Model> for IncomeResponse {
    fn from(income: incomes::Model) -> Self {
        Self {
            id: income.id,
            amount: income.amount,
            description: income.description,
            source: income.source,
            date: income.date.with_timezone(&Utc),
            created_at: income.created_at.with_timezone(&Utc),
            updated_at: income.updated_at.with_timezone(&Utc),
        }
    }
}

/// A page of income.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeListResponse {
    /// Entries on this page.
    pub incomes: Vec<IncomeResponse>,
    /// Matching entries across all pages.
    pub total: u64,
    /// Current page.
    pub page: u64,
    /// Page count.
    pub total_pages: u64,
}

/// Income in one source.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStatResponse {
    /// Source name.
    pub source: String,
    /// Sum of amounts.
    pub total_amount: Decimal,
    /// Number of entries.
    pub count: u64,
}

impl From<SourceTotal> for SourceStatResponse {
    fn from(row: SourceTotal) -> Self {
        Self {
            source: row.source,
            total_amount: row.total_amount,
            count: row.count,
        }
    }
}

/// Income summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStatsResponse {
    /// Sum of amounts.
    pub total_amount: Decimal,
    /// Number of entries.
    pub total_count: u64,
    /// Mean amount.
    pub average_amount: Decimal,
    /// Per-source totals, largest first.
    pub source_breakdown: Vec<SourceStatResponse>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /income - Record income.
async fn create_income(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateIncomeRequest>,
) -> ApiResult<impl IntoResponse> {
    let income = IncomeRepository::new((*state.db).clone())
        .create(
            auth.id,
            CreateIncomeInput {
                amount: payload.amount,
                description: payload.description,
                source: payload.source,
                date: payload.date.map(DateInput::instant),
            },
        )
        .await?;

    info!(user_id = %auth.id, income_id = %income.id, "Income recorded");
    Ok(created(
        "Income created successfully",
        IncomeResponse::from(income),
    ))
}

/// GET /income - Paginated, filtered list.
async fn list_income(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<ListIncomeQuery>,
) -> ApiResult<impl IntoResponse> {
    let defaults = PageRequest::default();
    let page = PageRequest::new(
        query.page.unwrap_or(defaults.page),
        query.limit.unwrap_or(defaults.limit),
    );
    let filter = IncomeFilter {
        start: query.start_date.map(DateInput::instant),
        end: query.end_date.map(DateInput::instant),
        search: query.search,
    };

    let (rows, total) = IncomeRepository::new((*state.db).clone())
        .list(auth.id, &filter, page)
        .await?;

    Ok(ok(IncomeListResponse {
        incomes: rows.into_iter().map(IncomeResponse::from).collect(),
        total,
        page: page.page,
        total_pages: page.meta(total).total_pages,
    }))
}

/// GET /income/{id} - One entry.
async fn get_income(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let income = IncomeRepository::new((*state.db).clone())
        .get(auth.id, id)
        .await?;

    Ok(ok(IncomeResponse::from(income)))
}

/// PUT /income/{id} - Update an entry.
async fn update_income(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateIncomeRequest>,
) -> ApiResult<impl IntoResponse> {
    let income = IncomeRepository::new((*state.db).clone())
        .update(
            auth.id,
            id,
            UpdateIncomeInput {
                amount: payload.amount,
                description: payload.description,
                source: payload.source,
                date: payload.date.map(DateInput::instant),
            },
        )
        .await?;

    Ok(ok_with_message(
        "Income updated successfully",
        IncomeResponse::from(income),
    ))
}

/// DELETE /income/{id} - Delete an entry.
async fn delete_income(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    IncomeRepository::new((*state.db).clone())
        .delete(auth.id, id)
        .await?;

    info!(user_id = %auth.id, income_id = %id, "Income deleted");
    Ok(message("Income deleted successfully"))
}

/// GET /income/stats - Totals and per-source breakdown.
async fn income_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<DateRangeQuery>,
) -> ApiResult<impl IntoResponse> {
    let (start, end) = query.bounds();
    let stats = IncomeRepository::new((*state.db).clone())
        .stats(auth.id, start, end)
        .await?;

    Ok(ok(IncomeStatsResponse {
        total_amount: stats.totals.total_amount,
        total_count: stats.totals.total_count,
        average_amount: stats.totals.average_amount,
        source_breakdown: stats
            .by_source
            .into_iter()
            .map(SourceStatResponse::from)
            .collect(),
    }))
}
