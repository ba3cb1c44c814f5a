//! Conversion of domain errors into HTTP responses.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;
use validator::ValidationErrors;

use spendwise_core::auth::PasswordError;
use spendwise_db::repositories::{
    BudgetError, CategoryError, ExpenseError, IncomeError, UserError,
};
use spendwise_shared::{AppError, JwtError};

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned by handlers; renders as `{success: false, error, message}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// 401 with the given message.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self(AppError::Unauthorized(message.into()))
    }

    /// 404 with the given message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self(AppError::NotFound(message.into()))
    }

    /// 400 with the given message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }

    /// 409 with the given message.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self(AppError::Conflict(message.into()))
    }

    /// 500; the detail is logged, never sent.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self(AppError::Internal(detail.into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        if err.is_server_error() {
            error!(error = %err, "Request failed");
        }

        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = json!({
            "success": false,
            "error": err.error_code(),
            "message": err.public_message(),
        });

        (status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self(AppError::Database(err.to_string()))
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => Self::not_found("User not found"),
            UserError::EmailTaken => Self::conflict("Email is already taken"),
            UserError::Database(e) => e.into(),
        }
    }
}

impl From<CategoryError> for ApiError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::NotFound(_) => Self::not_found("Category not found"),
            CategoryError::DuplicateName => {
                Self::conflict("Category with this name already exists")
            }
            CategoryError::Database(e) => e.into(),
        }
    }
}

impl From<ExpenseError> for ApiError {
    fn from(err: ExpenseError) -> Self {
        match err {
            ExpenseError::NotFound(_) => Self::not_found("Expense not found"),
            ExpenseError::CategoryNotFound(_) => Self::not_found("Category not found"),
            ExpenseError::Database(e) => e.into(),
        }
    }
}

impl From<IncomeError> for ApiError {
    fn from(err: IncomeError) -> Self {
        match err {
            IncomeError::NotFound(_) => Self::not_found("Income not found"),
            IncomeError::Database(e) => e.into(),
        }
    }
}

impl From<BudgetError> for ApiError {
    fn from(err: BudgetError) -> Self {
        match err {
            BudgetError::NotFound(_) => Self::not_found("Budget not found"),
            BudgetError::CategoryNotFound(_) => Self::not_found("Category not found"),
            BudgetError::Invalid(rule) => Self::bad_request(rule.to_string()),
            BudgetError::Database(e) => e.into(),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .collect();
        messages.sort();
        Self::bad_request(messages.join(", "))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}
