//! Defines the expense store trait and its query types.

use time::Date;

use crate::{
    Error,
    filter::{DateRangeFilter, FilterSpec, SortKey, SortOrder},
    models::{DatabaseID, Expense, ExpenseUpdate, NewExpense, UserID},
    pagination::PageQuery,
};

/// Handles the creation, retrieval and mutation of expenses.
///
/// Every operation is scoped to an owner: a record that exists but belongs to
/// another user behaves exactly like a record that does not exist.
pub trait ExpenseStore {
    /// Create a new expense owned by `owner`.
    ///
    /// The store assigns the id and both timestamps.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an unexpected SQL error.
    fn create(&mut self, owner: UserID, new_expense: NewExpense) -> Result<Expense, Error>;

    /// Retrieve the expense with `id` if it belongs to `owner`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] when no such expense exists or when it is
    /// owned by a different user.
    fn get(&self, id: DatabaseID, owner: UserID) -> Result<Expense, Error>;

    /// Retrieve a page of expenses in the way defined by `query`, along with
    /// the total count of matching records.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an unexpected SQL error.
    fn query(&self, query: &ExpenseQuery) -> Result<ExpensePage, Error>;

    /// Retrieve every expense of `owner` within `date_range`, unpaginated.
    ///
    /// This feeds the aggregation engine, which needs the full record set.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an unexpected SQL error.
    fn get_all(&self, owner: UserID, date_range: &DateRangeFilter) -> Result<Vec<Expense>, Error>;

    /// Apply a partial update to the expense with `id` if it belongs to
    /// `owner`, and bump its `updated_at` timestamp.
    ///
    /// Fields absent from `update` retain their prior values.
    ///
    /// # Errors
    /// Returns [Error::NotFound] when no such expense exists for `owner`.
    fn update(
        &mut self,
        id: DatabaseID,
        owner: UserID,
        update: ExpenseUpdate,
    ) -> Result<Expense, Error>;

    /// Delete the expense with `id` if it belongs to `owner`. Irreversible.
    ///
    /// # Errors
    /// Returns [Error::NotFound] when no such expense exists for `owner`.
    fn delete(&mut self, id: DatabaseID, owner: UserID) -> Result<(), Error>;
}

/// Defines how expenses should be fetched from [ExpenseStore::query].
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseQuery {
    /// The user whose expenses to fetch.
    pub owner: UserID,
    /// The predicates from the filter pipeline, applied store-side.
    pub filter: FilterSpec,
    /// Orders expenses by this key. `None` returns expenses in the order
    /// they were stored.
    pub sort_key: Option<SortKey>,
    /// The direction to sort in.
    pub sort_order: SortOrder,
    /// The page of the filtered, ordered result to return.
    pub page: PageQuery,
    /// The evaluation day for relative date ranges.
    pub today: Date,
}

/// One page of expenses plus the total count of records matching the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpensePage {
    pub expenses: Vec<Expense>,
    pub total: u64,
}
