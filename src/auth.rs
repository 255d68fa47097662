//! Implements registration, sign-in and bearer token verification.
//!
//! A successful registration or sign-in returns a signed JSON Web Token which
//! clients send back in the `Authorization: Bearer` header. The [Claims]
//! extractor rejects requests without a valid token, so protected handlers
//! take it as an argument and never see unauthenticated traffic.

use std::str::FromStr;

use axum::{
    Json, RequestPartsExt,
    extract::{FromRequestParts, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    models::{NewUser, PasswordHash, User, UserID},
    stores::UserStore,
};

// Token handling is adapted from
// https://github.com/tokio-rs/axum/blob/main/examples/jwt/src/main.rs

/// How long a bearer token stays valid after it is issued.
const TOKEN_DURATION: Duration = Duration::days(7);

/// The contents of a JSON Web Token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The id of the user the token was issued to.
    pub sub: i64,
    /// The expiry time of the token as a unix timestamp.
    pub exp: usize,
    /// The time the token was issued as a unix timestamp.
    pub iat: usize,
    /// Email associated with the token.
    pub email: String,
}

impl Claims {
    /// The id of the user the token was issued to.
    pub fn user_id(&self) -> UserID {
        UserID::new(self.sub)
    }
}

impl FromRequestParts<AppState> for Claims {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::InvalidToken)?;

        let token_data = decode_jwt(bearer.token(), &state.decoding_key)?;

        Ok(token_data.claims)
    }
}

/// The data submitted when registering a new account.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    /// The display name for the new account.
    pub name: String,
    /// The email address to register with.
    pub email: String,
    /// The raw password. Checked for strength before it is hashed.
    pub password: String,
}

/// The data submitted when signing in.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// Email entered during sign-in.
    pub email: String,
    /// Password entered during sign-in.
    pub password: String,
}

/// The errors that can occur during authentication.
#[derive(Debug)]
pub enum AuthError {
    /// The email or password was wrong. Which one is deliberately not said.
    WrongCredentials,
    /// The bearer token was missing, malformed, expired or badly signed.
    InvalidToken,
    /// The token could not be signed.
    TokenCreation,
    /// An unexpected error, e.g. from the password hashing library.
    InternalError,
    /// An error from outside the auth layer, e.g. a validation failure.
    Domain(Error),
}

impl From<Error> for AuthError {
    fn from(value: Error) -> Self {
        AuthError::Domain(value)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::WrongCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            AuthError::TokenCreation => (StatusCode::INTERNAL_SERVER_ERROR, "Token creation error"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AuthError::Domain(error) => return error.into_response(),
        };

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// The subset of [User] that is safe to send to clients.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    id: i64,
    name: String,
    email: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().as_i64(),
            name: user.name().to_owned(),
            email: user.email().to_string(),
        }
    }
}

/// Handler for registration requests.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The name is empty.
/// - The email is not a valid email address.
/// - The email is already registered.
/// - The password is too easy to guess.
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegisterForm>,
) -> Result<Response, AuthError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(Error::single_field("name", "Name is required").into());
    }

    let email = email_address::EmailAddress::from_str(form.email.trim())
        .map_err(|_| Error::single_field("email", "A valid email address is required"))?;

    let password_hash = PasswordHash::from_raw_password(&form.password, PasswordHash::DEFAULT_COST)?;

    let mut user_store = state.user_store;
    let user = user_store.create(NewUser {
        name: name.to_owned(),
        email,
        password_hash,
    })?;

    let token = encode_jwt(&user, &state.encoding_key)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User registered successfully",
            "token": token,
            "user": UserResponse::from(&user),
        })),
    )
        .into_response())
}

/// Handler for sign-in requests.
///
/// # Errors
///
/// This function will return [AuthError::WrongCredentials] when the email
/// does not belong to a registered user or the password does not match. The
/// two cases are indistinguishable to the client.
pub async fn log_in(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, AuthError> {
    let email = email_address::EmailAddress::from_str(credentials.email.trim())
        .map_err(|_| AuthError::WrongCredentials)?;

    let user = state.user_store.get_by_email(&email).map_err(|error| match error {
        Error::NotFound => AuthError::WrongCredentials,
        error => {
            tracing::error!("Error fetching user: {error}");
            AuthError::InternalError
        }
    })?;

    let password_is_correct = user
        .password_hash()
        .verify(&credentials.password)
        .map_err(|error| {
            tracing::error!("Error verifying password: {error}");
            AuthError::InternalError
        })?;

    if !password_is_correct {
        return Err(AuthError::WrongCredentials);
    }

    let token = encode_jwt(&user, &state.encoding_key)?;

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "token": token,
        "user": UserResponse::from(&user),
    }))
    .into_response())
}

/// Handler that reports whether the caller's bearer token is still valid, and
/// which user it belongs to.
///
/// # Errors
///
/// This function will return [AuthError::InvalidToken] via the [Claims]
/// extractor when the token is missing or invalid, and
/// [Error::NotFound] when the user the token was issued to no longer exists.
pub async fn verify(State(state): State<AppState>, claims: Claims) -> Result<Response, AuthError> {
    let user = state.user_store.get_by_id(claims.user_id())?;

    Ok(Json(json!({
        "success": true,
        "user": UserResponse::from(&user),
    }))
    .into_response())
}

fn encode_jwt(user: &User, encoding_key: &EncodingKey) -> Result<String, AuthError> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user.id().as_i64(),
        exp: (now + TOKEN_DURATION).unix_timestamp() as usize,
        iat: now.unix_timestamp() as usize,
        email: user.email().to_string(),
    };

    encode(&Header::default(), &claims, encoding_key).map_err(|error| {
        tracing::error!("Error creating token: {error}");
        AuthError::TokenCreation
    })
}

fn decode_jwt(token: &str, decoding_key: &DecodingKey) -> Result<TokenData<Claims>, AuthError> {
    decode(token, decoding_key, &Validation::default()).map_err(|_| AuthError::InvalidToken)
}
