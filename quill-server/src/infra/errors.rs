use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use quill_core::auth::HashError;
use quill_core::domain::ValidationError;
use quill_core::{AuthError, CoreError};

pub type AppResult<T> = Result<T, AppError>;

pub const CREDENTIALS_MESSAGE: &str = "Could not validate credentials";
pub const INVALID_LOGIN_MESSAGE: &str = "Invalid Credentials";
pub const FORBIDDEN_MESSAGE: &str = "Not authorized to perform this action";

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));

        let mut response = (self.status, body).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated => Self::unauthorized(CREDENTIALS_MESSAGE),
            AuthError::Forbidden => Self::forbidden(FORBIDDEN_MESSAGE),
            AuthError::NotFound(what) => Self::not_found(format!("{what} not found")),
            AuthError::InputTooLong | AuthError::MalformedInput(_) => {
                Self::unprocessable(err.to_string())
            }
            AuthError::Unavailable(reason) => {
                tracing::error!(error = %reason, "identity store unavailable");
                Self::internal("Authentication backend unavailable")
            }
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(what) => Self::not_found(format!("{what} not found")),
            CoreError::Conflict(msg) => Self::conflict(msg),
            CoreError::Database(msg) => {
                tracing::error!(error = %msg, "database operation failed");
                Self::internal("Database operation failed")
            }
        }
    }
}

impl From<HashError> for AppError {
    fn from(err: HashError) -> Self {
        match err {
            HashError::InputTooLong => Self::unprocessable(err.to_string()),
            other => {
                tracing::error!(error = %other, "password hashing failed");
                Self::internal("Failed to hash password")
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::unprocessable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_kinds_map_to_distinct_statuses() {
        assert_eq!(
            AppError::from(AuthError::Unauthenticated).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::from(AuthError::Forbidden).status, StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::from(AuthError::NotFound("Post with id 1".into())).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(AuthError::Unavailable("down".into())).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unauthorized_responses_carry_bearer_challenge() {
        let response = AppError::from(AuthError::Unauthenticated).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );

        let forbidden = AppError::from(AuthError::Forbidden).into_response();
        assert!(forbidden.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn storage_kinds_map_to_distinct_statuses() {
        assert_eq!(
            AppError::from(CoreError::Conflict("email taken".into())).status,
            StatusCode::CONFLICT
        );
        let missing = AppError::from(CoreError::NotFound("user with id 3".into()));
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.message, "user with id 3 not found");
        assert_eq!(
            AppError::from(ValidationError::InvalidEmail).status,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn database_detail_is_not_exposed() {
        let err = AppError::from(CoreError::Database("password authentication failed".into()));
        assert_eq!(err.message, "Database operation failed");
    }
}
