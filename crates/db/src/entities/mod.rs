//! `SeaORM` entity definitions.

pub mod prelude;

pub mod budgets;
pub mod categories;
pub mod expenses;
pub mod incomes;
pub mod password_resets;
pub mod sessions;
pub mod users;
