use thiserror::Error;

/// Request-level outcome of the authentication and authorization core.
///
/// Every authentication failure is collapsed into [`AuthError::Unauthenticated`]
/// before it leaves the core; the specific reason (expired, forged, unknown
/// subject) is only ever logged at debug level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Could not validate credentials")]
    Unauthenticated,

    #[error("Not authorized to perform this action")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    #[error("input exceeds the maximum accepted length")]
    InputTooLong,

    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The identity store could not answer. Not an authentication verdict.
    #[error("identity store unavailable: {0}")]
    Unavailable(String),
}

/// Storage and domain errors raised by repositories.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(feature = "database")]
impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => CoreError::NotFound("row".to_string()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                CoreError::Conflict(db_err.message().to_string())
            }
            other => CoreError::Database(other.to_string()),
        }
    }
}

impl From<CoreError> for AuthError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(what) => AuthError::NotFound(what),
            other => AuthError::Unavailable(other.to_string()),
        }
    }
}
