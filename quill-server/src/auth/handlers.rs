use axum::{Form, Json, extract::State};
use quill_core::domain::{LoginForm, TokenResponse, normalize_email};
use tracing::{debug, info};

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult, INVALID_LOGIN_MESSAGE},
};

/// Exchange an email/password form for a bearer access token.
///
/// Unknown email and wrong password produce the same 401 and take the same
/// hashing path.
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Json<TokenResponse>> {
    let email = normalize_email(&form.username);
    let user = state.users.get_user_by_email(&email).await?;

    let stored_hash = user
        .as_ref()
        .map(|user| user.password_hash.clone())
        .unwrap_or_default();
    let verified = state
        .auth
        .verify_password(form.password, stored_hash)
        .await;

    let user = match user {
        Some(user) if verified => user,
        _ => {
            debug!("rejected login attempt");
            return Err(AppError::unauthorized(INVALID_LOGIN_MESSAGE));
        }
    };

    let issued = state.auth.issue_access_token(user.id, None).map_err(|err| {
        tracing::error!(error = %err, "failed to sign access token");
        AppError::internal("Failed to generate access token")
    })?;

    info!(user_id = user.id, expires_at = %issued.expires_at, "issued access token");
    Ok(Json(TokenResponse::bearer(issued.token)))
}
