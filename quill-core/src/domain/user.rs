//! User records and their request/response views.
//!
//! The stored [`User`] carries the Argon2id hash of the password. That hash is
//! skipped by serde and hidden from `Debug`, and every outward view
//! ([`UserResponse`]) is built without it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::MAX_PASSWORD_BYTES;

/// Stored user record.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Public view of a user; also the shape of an authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

/// Registration payload.
#[derive(Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

impl fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid email address")]
    InvalidEmail,
    #[error("full name must not be empty")]
    EmptyFullName,
    #[error("password must not be empty")]
    EmptyPassword,
    #[error("password exceeds {MAX_PASSWORD_BYTES} bytes")]
    PasswordTooLong,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !is_plausible_email(&normalize_email(&self.email)) {
            return Err(ValidationError::InvalidEmail);
        }
        if self.full_name.trim().is_empty() {
            return Err(ValidationError::EmptyFullName);
        }
        if self.password.is_empty() {
            return Err(ValidationError::EmptyPassword);
        }
        if self.password.len() > MAX_PASSWORD_BYTES {
            return Err(ValidationError::PasswordTooLong);
        }
        Ok(())
    }
}

/// Insert payload for the users table. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
}

/// OAuth2 password-grant form; `username` carries the email address.
#[derive(Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Emails are compared case-insensitively and without surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}
