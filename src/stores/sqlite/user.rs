//! Implements a SQLite backed user store.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use email_address::EmailAddress;
use rusqlite::{Connection, Row};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{NewUser, PasswordHash, User, UserID},
    stores::UserStore,
};

/// Stores users in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteUserStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl UserStore for SQLiteUserStore {
    /// Create a new user in the database.
    ///
    /// # Errors
    /// Returns [Error::DuplicateEmail] when the email address is already
    /// registered, or an [Error::SqlError] on unexpected SQL errors.
    ///
    /// # Panics
    /// Panics if the lock for the database connection is already held by the
    /// same thread.
    fn create(&mut self, new_user: NewUser) -> Result<User, Error> {
        let user = self
            .connection
            .lock()
            .unwrap()
            .prepare(
                "INSERT INTO user (name, email, password_hash) VALUES (?1, ?2, ?3)
                 RETURNING id, name, email, password_hash",
            )?
            .query_row(
                (
                    &new_user.name,
                    new_user.email.to_string(),
                    new_user.password_hash.to_string(),
                ),
                Self::map_row,
            )?;

        Ok(user)
    }

    fn get_by_email(&self, email: &EmailAddress) -> Result<User, Error> {
        let user = self
            .connection
            .lock()
            .unwrap()
            .prepare("SELECT id, name, email, password_hash FROM user WHERE email = ?1")?
            .query_row([email.to_string()], Self::map_row)?;

        Ok(user)
    }

    fn get_by_id(&self, id: UserID) -> Result<User, Error> {
        let user = self
            .connection
            .lock()
            .unwrap()
            .prepare("SELECT id, name, email, password_hash FROM user WHERE id = ?1")?
            .query_row([id.as_i64()], Self::map_row)?;

        Ok(user)
    }
}

impl CreateTable for SQLiteUserStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS user (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    email TEXT UNIQUE NOT NULL,
                    password_hash TEXT NOT NULL
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteUserStore {
    type ReturnType = User;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id: i64 = row.get(offset)?;
        let name = row.get(offset + 1)?;
        let raw_email: String = row.get(offset + 2)?;
        let raw_password_hash: String = row.get(offset + 3)?;

        let email = EmailAddress::from_str(&raw_email).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                offset + 2,
                rusqlite::types::Type::Text,
                Box::new(error),
            )
        })?;

        Ok(User::new(
            UserID::new(id),
            name,
            email,
            PasswordHash::new_unchecked(&raw_password_hash),
        ))
    }
}
