//! Implements a SQLite backed expense store.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use rusqlite::{Connection, Row, params_from_iter, types::Value};
use time::OffsetDateTime;

use crate::{
    Error,
    db::{CreateTable, MapRow},
    filter::{DateRangeFilter, SortKey, SortOrder},
    models::{Category, DatabaseID, Expense, ExpenseUpdate, NewExpense, UserID},
    stores::{ExpensePage, ExpenseQuery, ExpenseStore},
};

/// Stores expenses in a SQLite database.
///
/// The [User](crate::models::User) table must be set up in the same database
/// because expenses reference their owner by foreign key.
#[derive(Debug, Clone)]
pub struct SQLiteExpenseStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteExpenseStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    const COLUMNS: &'static str =
        "id, title, amount, date, category, description, user_id, created_at, updated_at";
}

impl ExpenseStore for SQLiteExpenseStore {
    /// Create a new expense in the database.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an
    /// unexpected SQL error.
    ///
    /// # Panics
    /// Panics if the lock for the database connection is already held by the
    /// same thread.
    fn create(&mut self, owner: UserID, new_expense: NewExpense) -> Result<Expense, Error> {
        let now = OffsetDateTime::now_utc();

        let expense = self
            .connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "INSERT INTO expense (title, amount, date, category, description, user_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 RETURNING {}",
                Self::COLUMNS
            ))?
            .query_row(
                (
                    &new_expense.title,
                    new_expense.amount,
                    new_expense.date,
                    new_expense.category.as_str(),
                    &new_expense.description,
                    owner.as_i64(),
                    now,
                    now,
                ),
                Self::map_row,
            )?;

        Ok(expense)
    }

    /// Retrieve an expense by its `id`, scoped to `owner`.
    ///
    /// An expense owned by a different user is reported as [Error::NotFound]
    /// rather than a permission error so that ids do not leak across owners.
    fn get(&self, id: DatabaseID, owner: UserID) -> Result<Expense, Error> {
        let expense = self
            .connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT {} FROM expense WHERE id = ?1 AND user_id = ?2",
                Self::COLUMNS
            ))?
            .query_row((id, owner.as_i64()), Self::map_row)?;

        Ok(expense)
    }

    /// Query for a page of expenses and the total count of matching records.
    ///
    /// The filter semantics match [crate::filter::filter_and_sort]: the WHERE
    /// clause reproduces the predicates and the ORDER BY uses the record id
    /// as a tie-break so that equal keys keep insertion order. One caveat:
    /// SQLite's `lower()` and `NOCASE` fold ASCII only, so search matching
    /// and title ordering ignore case for ASCII text while the in-memory
    /// pipeline also folds non-ASCII characters.
    fn query(&self, query: &ExpenseQuery) -> Result<ExpensePage, Error> {
        let mut where_clause_parts = vec!["user_id = ?1".to_owned()];
        let mut query_parameters = vec![Value::Integer(query.owner.as_i64())];

        if let Some(category) = query.filter.category {
            where_clause_parts.push(format!("category = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(category.as_str().to_owned()));
        }

        if let Some((start, end)) = query.filter.date_range.bounds(query.today) {
            where_clause_parts.push(format!(
                "date BETWEEN ?{} AND ?{}",
                query_parameters.len() + 1,
                query_parameters.len() + 2,
            ));
            query_parameters.push(Value::Text(start.to_string()));
            query_parameters.push(Value::Text(end.to_string()));
        }

        if let Some(term) = query.filter.search_term.as_deref()
            && !term.is_empty()
        {
            where_clause_parts.push(format!(
                "instr(lower(title), lower(?{})) > 0",
                query_parameters.len() + 1
            ));
            query_parameters.push(Value::Text(term.to_owned()));
        }

        let where_clause = format!("WHERE {}", where_clause_parts.join(" AND "));

        let order_clause = match query.sort_key {
            None => "ORDER BY id ASC".to_owned(),
            Some(key) => {
                let column = match key {
                    SortKey::Date => "date",
                    SortKey::Amount => "amount",
                    SortKey::Title => "title COLLATE NOCASE",
                };
                let direction = match query.sort_order {
                    SortOrder::Ascending => "ASC",
                    SortOrder::Descending => "DESC",
                };

                format!("ORDER BY {column} {direction}, id ASC")
            }
        };

        let query_string = format!(
            "SELECT {} FROM expense {} {} LIMIT {} OFFSET {}",
            Self::COLUMNS,
            where_clause,
            order_clause,
            query.page.limit,
            query.page.offset(),
        );
        let count_string = format!("SELECT COUNT(id) FROM expense {where_clause}");

        let connection = self.connection.lock().unwrap();

        let expenses = connection
            .prepare(&query_string)?
            .query_map(params_from_iter(query_parameters.iter()), Self::map_row)?
            .map(|maybe_expense| maybe_expense.map_err(Error::SqlError))
            .collect::<Result<Vec<Expense>, Error>>()?;

        // SQLite reports counts as i64.
        let total: i64 = connection.query_row(
            &count_string,
            params_from_iter(query_parameters.iter()),
            |row| row.get(0),
        )?;

        Ok(ExpensePage {
            expenses,
            total: total as u64,
        })
    }

    /// Retrieve every expense of `owner` within `date_range`, in insertion
    /// order.
    fn get_all(&self, owner: UserID, date_range: &DateRangeFilter) -> Result<Vec<Expense>, Error> {
        let today = OffsetDateTime::now_utc().date();
        let mut where_clause_parts = vec!["user_id = ?1".to_owned()];
        let mut query_parameters = vec![Value::Integer(owner.as_i64())];

        if let Some((start, end)) = date_range.bounds(today) {
            where_clause_parts.push("date BETWEEN ?2 AND ?3".to_owned());
            query_parameters.push(Value::Text(start.to_string()));
            query_parameters.push(Value::Text(end.to_string()));
        }

        let query_string = format!(
            "SELECT {} FROM expense WHERE {} ORDER BY id ASC",
            Self::COLUMNS,
            where_clause_parts.join(" AND "),
        );

        self.connection
            .lock()
            .unwrap()
            .prepare(&query_string)?
            .query_map(params_from_iter(query_parameters.iter()), Self::map_row)?
            .map(|maybe_expense| maybe_expense.map_err(Error::SqlError))
            .collect()
    }

    /// Apply a partial update to an expense and bump its `updated_at`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] when the expense does not exist for `owner`.
    fn update(
        &mut self,
        id: DatabaseID,
        owner: UserID,
        update: ExpenseUpdate,
    ) -> Result<Expense, Error> {
        let merged = update.apply_to(self.get(id, owner)?);

        let expense = self
            .connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "UPDATE expense
                 SET title = ?1, amount = ?2, date = ?3, category = ?4, description = ?5, updated_at = ?6
                 WHERE id = ?7 AND user_id = ?8
                 RETURNING {}",
                Self::COLUMNS
            ))?
            .query_row(
                (
                    &merged.title,
                    merged.amount,
                    merged.date,
                    merged.category.as_str(),
                    &merged.description,
                    OffsetDateTime::now_utc(),
                    id,
                    owner.as_i64(),
                ),
                Self::map_row,
            )?;

        Ok(expense)
    }

    /// Delete an expense. Irreversible.
    ///
    /// # Errors
    /// Returns [Error::NotFound] when the expense does not exist for `owner`.
    fn delete(&mut self, id: DatabaseID, owner: UserID) -> Result<(), Error> {
        let rows_deleted = self.connection.lock().unwrap().execute(
            "DELETE FROM expense WHERE id = ?1 AND user_id = ?2",
            (id, owner.as_i64()),
        )?;

        if rows_deleted == 0 {
            Err(Error::NotFound)
        } else {
            Ok(())
        }
    }
}

impl CreateTable for SQLiteExpenseStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS expense (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    amount REAL NOT NULL,
                    date TEXT NOT NULL,
                    category TEXT NOT NULL,
                    description TEXT,
                    user_id INTEGER NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteExpenseStore {
    type ReturnType = Expense;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id = row.get(offset)?;
        let title = row.get(offset + 1)?;
        let amount = row.get(offset + 2)?;
        let date = row.get(offset + 3)?;
        let category_name: String = row.get(offset + 4)?;
        let description = row.get(offset + 5)?;
        let user_id: i64 = row.get(offset + 6)?;
        let created_at = row.get(offset + 7)?;
        let updated_at = row.get(offset + 8)?;

        let category = Category::from_str(&category_name).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                offset + 4,
                rusqlite::types::Type::Text,
                Box::new(error),
            )
        })?;

        Ok(Expense {
            id,
            title,
            amount,
            date,
            category,
            description,
            user_id: Some(UserID::new(user_id)),
            created_at,
            updated_at,
        })
    }
}
