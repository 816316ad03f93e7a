use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use quill_core::AuthError;
use quill_core::auth::Identity;
use tracing::debug;

use crate::infra::app_state::AppState;
use crate::infra::errors::AppError;

/// The authenticated caller of a protected route.
///
/// Rejects with 401 when the bearer token is missing, invalid, expired, or
/// names a user that no longer exists.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            debug!("request without bearer credentials");
            return Err(AuthError::Unauthenticated.into());
        };

        let identity = state
            .auth
            .resolve_identity(token, state.users.as_ref())
            .await?;
        Ok(Self(identity))
    }
}

/// Pull the credential out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
