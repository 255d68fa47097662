//! This file defines types for password validation and hashing.
//!
//! A raw password string is first checked for strength as a
//! [ValidatedPassword], then salted and hashed into a [PasswordHash] which is
//! what gets stored.

use std::fmt::Display;

use bcrypt::{BcryptError, hash, verify};
use serde::{Deserialize, Serialize};
use zxcvbn::{Score, feedback::Feedback, zxcvbn};

use crate::Error;

/// A password that passed the strength check but has not been hashed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check the strength of a raw password string.
    ///
    /// # Errors
    /// Returns [Error::PasswordTooWeak] with the analyzer's feedback when the
    /// password is too easy to guess.
    pub fn new(raw_password: &str) -> Result<Self, Error> {
        let analysis = zxcvbn(raw_password, &[]);

        match analysis.score() {
            Score::Three | Score::Four => Ok(Self(raw_password.to_owned())),
            _ => Err(Error::PasswordTooWeak(
                analysis
                    .feedback()
                    .unwrap_or(&Feedback::default())
                    .to_string(),
            )),
        }
    }

    /// Create a `ValidatedPassword` without the strength check.
    ///
    /// The caller should ensure the password is acceptable. Not `unsafe`
    /// because a weak password causes incorrect behaviour, not memory
    /// unsafety.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// An alias for the default cost for hashing passwords.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash a validated password with the given bcrypt `cost`.
    ///
    /// Use [PasswordHash::DEFAULT_COST] unless there is a reason not to
    /// (tests use a lower cost to stay fast).
    ///
    /// # Errors
    /// Returns [Error::HashingError] if the underlying library fails.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap an existing hash string, e.g. one read back from the database.
    pub fn new_unchecked(raw_hash: &str) -> Self {
        Self(raw_hash.to_owned())
    }

    /// Strength-check and hash a raw password string in one step.
    ///
    /// # Errors
    /// Returns [Error::PasswordTooWeak] or [Error::HashingError].
    pub fn from_raw_password(raw_password: &str, cost: u32) -> Result<Self, Error> {
        PasswordHash::new(ValidatedPassword::new(raw_password)?, cost)
    }

    /// Check whether `raw_password` matches this hash.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        verify(raw_password, &self.0)
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}


#[cfg(test)]
mod password_hash_tests {
    use crate::models::{PasswordHash, ValidatedPassword};

    const TEST_COST: u32 = 4;

    #[test]
    fn verify_accepts_matching_password() {
        let password = "correcthorsebatterystaple1";
        let hash =
            PasswordHash::new(ValidatedPassword::new_unchecked(password), TEST_COST).unwrap();

        assert!(hash.verify(password).unwrap());
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = PasswordHash::new(
            ValidatedPassword::new_unchecked("correcthorsebatterystaple1"),
            TEST_COST,
        )
        .unwrap();

        assert!(!hash.verify("somethingelse").unwrap());
    }

    #[test]
    fn display_hides_raw_password() {
        let password = ValidatedPassword::new_unchecked("hunter2hunter2");

        assert_eq!(password.to_string(), "********");
    }
}
