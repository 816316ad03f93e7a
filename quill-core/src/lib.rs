//! # Quill Core
//!
//! Authentication and authorization core for the Quill posting service, plus
//! the domain types and storage ports the HTTP layer builds on.
//!
//! ## Overview
//!
//! - [`auth`]: Argon2id credential hashing, signed access tokens, identity
//!   resolution and the ownership guard
//! - [`domain`]: users, posts and their request/response views
//! - [`database`]: repository traits with PostgreSQL and in-memory adapters
//! - [`error`]: the `Unauthenticated | Forbidden | NotFound` taxonomy and
//!   storage errors
//!
//! ## Feature Flags
//!
//! - `database` (default): PostgreSQL adapter and embedded migrations via SQLx
//! - `pg-tests`: enables tests that need a live PostgreSQL server
//!
//! ## Example
//!
//! ```no_run
//! use quill_core::auth::{AuthCore, AuthSettings};
//! use quill_core::database::InMemoryDatabase;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let core = AuthCore::new(&AuthSettings::new("change-me")?)?;
//! let store = InMemoryDatabase::new();
//!
//! let token = core.issue_access_token(1, None)?.token;
//! let identity = core.resolve_identity(&token, &store).await;
//! assert!(identity.is_err()); // user 1 does not exist in an empty store
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod database;
pub mod domain;
pub mod error;

pub use error::{AuthError, CoreError, Result};

/// Embedded schema migrations for the PostgreSQL adapter.
#[cfg(feature = "database")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
