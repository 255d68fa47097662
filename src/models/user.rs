//! This file defines a user of the application.
//!
//! Users exist only to own expenses: every authenticated expense operation is
//! scoped to the user the bearer token resolves to.

use std::fmt::Display;

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};

use crate::models::PasswordHash;

/// A newtype wrapper for integer user IDs.
///
/// This keeps user IDs from being confused with expense IDs at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserID(i64);

impl UserID {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserID,
    name: String,
    email: EmailAddress,
    password_hash: PasswordHash,
}

impl User {
    /// Create a user from its stored parts.
    ///
    /// Used by stores when mapping database rows; to register a new user see
    /// [crate::stores::UserStore::create].
    pub fn new(id: UserID, name: String, email: EmailAddress, password_hash: PasswordHash) -> Self {
        Self {
            id,
            name,
            email,
            password_hash,
        }
    }

    /// The user's ID in the store.
    pub fn id(&self) -> UserID {
        self.id
    }

    /// The display name given at registration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The email address the user registered and logs in with.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// The user's salted and hashed password.
    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }
}

/// The validated input for registering a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The display name for the new user.
    pub name: String,
    /// The email address to register. Must not already be in use.
    pub email: EmailAddress,
    /// The hash of the password the user registered with.
    pub password_hash: PasswordHash,
}
