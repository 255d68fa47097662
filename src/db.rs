//! This module defines the traits for interacting with the application's
//! SQLite database and the function that sets up the schema.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    stores::sqlite::{SQLiteExpenseStore, SQLiteUserStore},
};

/// A trait for adding an object schema to a database.
pub trait CreateTable {
    /// Create a table for the model.
    ///
    /// # Errors
    /// Returns an error if the table already exists or if there is an SQL
    /// error.
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error>;
}

/// A trait for mapping a `rusqlite::Row` to a concrete rust type.
pub trait MapRow {
    /// The type this trait maps a row to.
    type ReturnType;

    /// Convert a row into [Self::ReturnType], starting at the first column.
    ///
    /// # Errors
    /// Returns an error if a column is missing or has an unexpected type.
    fn map_row(row: &Row) -> Result<Self::ReturnType, rusqlite::Error> {
        Self::map_row_with_offset(row, 0)
    }

    /// Convert a row into [Self::ReturnType], starting at column `offset`.
    ///
    /// # Errors
    /// Returns an error if a column is missing or has an unexpected type.
    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error>;
}

/// Create the tables for the domain models and enable foreign keys.
///
/// # Errors
/// Returns an error if the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.execute("PRAGMA foreign_keys = ON", ())?;

    SQLiteUserStore::create_table(connection)?;
    SQLiteExpenseStore::create_table(connection)?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use crate::db::initialize;

    #[test]
    fn creates_tables_on_fresh_database() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('user', 'expense')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 2);
    }
}
