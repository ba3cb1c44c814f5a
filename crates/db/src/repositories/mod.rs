//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod budget;
pub mod category;
pub mod expense;
pub mod income;
pub mod password_reset;
pub mod session;
pub mod user;

pub use budget::{
    BudgetAlert, BudgetError, BudgetProgressReport, BudgetRecord, BudgetRepository,
    BudgetWithSpent, CreateBudgetInput, UpdateBudgetInput,
};
pub use category::{
    CategoryError, CategoryRepository, CategoryStats, CategoryWithCount, CreateCategoryInput,
    DEFAULT_CATEGORY_COLOR, DeleteOutcome, UpdateCategoryInput,
};
pub use expense::{
    CategoryBreakdown, CreateExpenseInput, ExpenseError, ExpenseFilter, ExpenseRepository,
    ExpenseStats, ExpenseWithCategory, UpdateExpenseInput, UserExpenseStats,
};
pub use income::{
    CreateIncomeInput, IncomeError, IncomeFilter, IncomeRepository, IncomeStats, SourceTotal,
    UpdateIncomeInput,
};
pub use password_reset::PasswordResetRepository;
pub use session::SessionRepository;
pub use user::{UpdateProfileInput, UserError, UserRepository};
