//! Defines the user store trait.

use email_address::EmailAddress;

use crate::{
    Error,
    models::{NewUser, User, UserID},
};

/// Handles the creation and retrieval of users.
pub trait UserStore {
    /// Create a new user in the store.
    ///
    /// # Errors
    /// Returns [Error::DuplicateEmail] when the email address is already
    /// registered, or an [Error::SqlError] on unexpected SQL errors.
    fn create(&mut self, new_user: NewUser) -> Result<User, Error>;

    /// Retrieve the user registered with `email`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] when no user has that email address.
    fn get_by_email(&self, email: &EmailAddress) -> Result<User, Error>;

    /// Retrieve the user with `id`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] when no user has that id.
    fn get_by_id(&self, id: UserID) -> Result<User, Error>;
}
