//! Defines the app level error type and its conversion to JSON responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

/// A single field-level validation failure.
///
/// Mirrors the structure clients expect in the `errors` array of a 400
/// response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// The name of the request field that failed validation.
    pub field: &'static str,
    /// A human-readable description of what is wrong with the field.
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_owned(),
        }
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request contained one or more invalid fields.
    ///
    /// Validation is checked before any store mutation, so a request that
    /// produces this error has not changed anything.
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// The requested record was not found.
    ///
    /// Also returned when the record exists but belongs to another user, so
    /// that record IDs do not leak across owners.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The email address given at registration is already in use.
    #[error("the email is already in use")]
    DuplicateEmail,

    /// A string did not name one of the known categories.
    #[error("{0} is not a valid category")]
    InvalidCategory(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    PasswordTooWeak(String),

    /// An unexpected error from the password hashing library.
    ///
    /// The detail string should only be logged on the server, never shown to
    /// clients.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// The local cache file could not be read or written.
    #[error("could not access the local cache file: {0}")]
    CacheIo(String),

    /// The local cache file or an imported file held malformed JSON.
    #[error("malformed JSON: {0}")]
    MalformedJson(String),
}

impl Error {
    /// Shortcut for a validation error on a single field.
    pub fn single_field(field: &'static str, message: &str) -> Self {
        Error::Validation(vec![FieldError::new(field, message)])
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::CacheIo(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::MalformedJson(value.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status_code, body) = match self {
            Error::Validation(field_errors) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "message": "Validation failed",
                    "errors": field_errors,
                }),
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                json!({
                    "success": false,
                    "message": "The requested resource could not be found",
                }),
            ),
            Error::DuplicateEmail => (
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "message": "A user with this email already exists",
                }),
            ),
            Error::PasswordTooWeak(feedback) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "message": format!("Password is too weak: {feedback}"),
                }),
            ),
            // Any errors not handled above are not intended for clients.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "success": false,
                        "message": "Internal server error",
                    }),
                )
            }
        };

        (status_code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod error_response_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{Error, error::FieldError};

    #[test]
    fn validation_maps_to_400() {
        let error = Error::Validation(vec![FieldError::new("amount", "must be positive")]);

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = Error::NotFound.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_errors_map_to_500_without_detail() {
        let response = Error::HashingError("bcrypt exploded".to_owned()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn sql_no_rows_converts_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }
}
