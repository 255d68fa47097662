//! Contains the domain models for the application.

mod category;
mod expense;
mod password;
mod user;

pub use category::Category;
pub use expense::{
    DESCRIPTION_MAX_CHARS, Expense, ExpenseUpdate, NewExpense, TITLE_MAX_CHARS,
};
pub use password::{PasswordHash, ValidatedPassword};
pub use user::{NewUser, User, UserID};

/// An alias for the integer type used for record IDs.
pub type DatabaseID = i64;
