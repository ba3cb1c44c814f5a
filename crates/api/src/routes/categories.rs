//! Category catalogue routes.

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::ApiResult,
    extractors::{DateInput, ValidatedJson, ValidatedQuery, validate_hex_color},
    middleware::AuthUser,
    response::{created, message, ok, ok_with_message},
    routes::expenses::ExpenseResponse,
};
use spendwise_core::reports::TotalStats;
use spendwise_db::{
    CategoryRepository,
    entities::categories,
    repositories::{CategoryWithCount, CreateCategoryInput, DeleteOutcome, UpdateCategoryInput},
};

/// Creates the category routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/categories/{id}/stats", get(category_stats))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a category.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    /// Unique name.
    #[validate(length(min = 1, max = 100, message = "Category name is required"))]
    pub name: String,
    /// Description.
    #[validate(length(max = 255))]
    pub description: Option<String>,
    /// `#RRGGBB`.
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
}

/// Request body for updating a category.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    /// New name.
    #[validate(length(min = 1, max = 100, message = "Category name is required"))]
    pub name: Option<String>,
    /// New description.
    #[validate(length(max = 255))]
    pub description: Option<String>,
    /// New color.
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// Query for listing categories.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListCategoriesQuery {
    /// Include deactivated categories.
    #[serde(default)]
    pub include_inactive: bool,
}

/// Optional date window.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    /// On or after.
    pub start_date: Option<DateInput>,
    /// On or before.
    pub end_date: Option<DateInput>,
}

impl DateRangeQuery {
    /// The window as instants.
    #[must_use]
    pub fn bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        (
            self.start_date.map(DateInput::instant),
            self.end_date.map(DateInput::instant),
        )
    }
}

/// Short category view embedded in expenses and budgets.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    /// Category ID.
    pub id: Uuid,
    /// Name.
    pub name: String,
    /// Color.
    pub color: String,
}

impl From<categories::Model> for CategorySummary {
    fn from(category: categories::Model) -> Self {
        Self {
            id: category.id,
            name: category.name,
            color: category.color,
        }
    }
}

/// Full category view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    /// Category ID.
    pub id: Uuid,
    /// Name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Color.
    pub color: String,
    /// Whether new expenses may use it.
    pub is_active: bool,
    /// Expenses filed under it, across all users.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense_count: Option<u64>,
    /// Created at timestamp.
    pub created_at: DateTime<Utc>,
    /// Updated at timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<categories::Model> for CategoryResponse {
    fn from(category: categories::Model) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            color: category.color,
            is_active: category.is_active,
            expense_count: None,
            created_at: category.created_at.with_timezone(&Utc),
            updated_at: category.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<CategoryWithCount> for CategoryResponse {
    fn from(row: CategoryWithCount) -> Self {
        Self {
            expense_count: Some(row.expense_count),
            ..Self::from(row.category)
        }
    }
}

/// Per-user figures for a category.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStatsResponse {
    /// The category.
    pub category: CategoryResponse,
    /// Totals over the window.
    pub stats: TotalStats,
    /// Ten most recent expenses.
    pub recent_expenses: Vec<ExpenseResponse>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /categories - Create a category.
async fn create_category(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateCategoryRequest>,
) -> ApiResult<impl IntoResponse> {
    let category = CategoryRepository::new((*state.db).clone())
        .create(CreateCategoryInput {
            name: payload.name,
            description: payload.description,
            color: payload.color,
        })
        .await?;

    info!(category_id = %category.id, name = %category.name, "Category created");
    Ok(created(
        "Category created successfully",
        CategoryResponse::from(category),
    ))
}

/// GET /categories - List categories with expense counts.
async fn list_categories(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ListCategoriesQuery>,
) -> ApiResult<impl IntoResponse> {
    let rows = CategoryRepository::new((*state.db).clone())
        .list(query.include_inactive)
        .await?;

    Ok(ok(rows
        .into_iter()
        .map(CategoryResponse::from)
        .collect::<Vec<_>>()))
}

/// GET /categories/{id} - Get a category.
async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let row = CategoryRepository::new((*state.db).clone())
        .get_with_count(id)
        .await?;

    Ok(ok(CategoryResponse::from(row)))
}

/// PUT /categories/{id} - Update a category.
async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateCategoryRequest>,
) -> ApiResult<impl IntoResponse> {
    let row = CategoryRepository::new((*state.db).clone())
        .update(
            id,
            UpdateCategoryInput {
                name: payload.name,
                description: payload.description,
                color: payload.color,
                is_active: payload.is_active,
            },
        )
        .await?;

    Ok(ok_with_message(
        "Category updated successfully",
        CategoryResponse::from(row),
    ))
}

/// DELETE /categories/{id} - Delete, or deactivate if expenses use it.
async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let outcome = CategoryRepository::new((*state.db).clone())
        .delete(id)
        .await?;

    info!(category_id = %id, ?outcome, "Category removed");
    Ok(message(match outcome {
        DeleteOutcome::Deactivated => {
            "Category deactivated successfully (has associated expenses)"
        }
        DeleteOutcome::Deleted => "Category deleted successfully",
    }))
}

/// GET /categories/{id}/stats - The caller's spending in a category.
async fn category_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedQuery(query): ValidatedQuery<DateRangeQuery>,
) -> ApiResult<impl IntoResponse> {
    let (start, end) = query.bounds();
    let stats = CategoryRepository::new((*state.db).clone())
        .stats(id, auth.id, start, end)
        .await?;

    Ok(ok(CategoryStatsResponse {
        category: stats.category.into(),
        stats: stats.stats,
        recent_expenses: stats
            .recent_expenses
            .into_iter()
            .map(ExpenseResponse::from)
            .collect(),
    }))
}
