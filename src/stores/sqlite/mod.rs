//! SQLite implementations of the store traits.

mod expense;
mod user;

pub use expense::SQLiteExpenseStore;
pub use user::SQLiteUserStore;
