//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use jsonwebtoken::{DecodingKey, EncodingKey};
use rusqlite::Connection;

use crate::{
    Error,
    db::initialize,
    stores::sqlite::{SQLiteExpenseStore, SQLiteUserStore},
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The store for managing user [expenses](crate::models::Expense).
    pub expense_store: SQLiteExpenseStore,
    /// The store for managing [users](crate::models::User).
    pub user_store: SQLiteUserStore,
    /// The key for signing bearer tokens.
    pub encoding_key: EncodingKey,
    /// The key for verifying bearer tokens.
    pub decoding_key: DecodingKey,
}

impl AppState {
    /// Create the application state from a database connection and the secret
    /// used to sign bearer tokens.
    ///
    /// Sets up the database schema if it does not exist yet.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the schema could not be created.
    pub fn new(connection: Connection, jwt_secret: &str) -> Result<Self, Error> {
        initialize(&connection)?;

        let connection = Arc::new(Mutex::new(connection));

        Ok(Self {
            expense_store: SQLiteExpenseStore::new(connection.clone()),
            user_store: SQLiteUserStore::new(connection),
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
        })
    }
}
