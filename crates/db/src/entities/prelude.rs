//! Entity re-exports.

pub use super::budgets::Entity as Budgets;
pub use super::categories::Entity as Categories;
pub use super::expenses::Entity as Expenses;
pub use super::incomes::Entity as Incomes;
pub use super::password_resets::Entity as PasswordResets;
pub use super::sessions::Entity as Sessions;
pub use super::users::Entity as Users;
