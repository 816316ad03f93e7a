//! # Quill Server
//!
//! Axum front end for [`quill_core`]: registration, form login that issues
//! bearer tokens, and owner-scoped post management.

pub mod auth;
pub mod infra;
pub mod posts;
pub mod routes;
pub mod users;

pub use routes::create_app;
