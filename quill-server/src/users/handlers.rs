use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use quill_core::domain::{CreateUserRequest, NewUser, UserResponse, normalize_email};
use tracing::info;

use crate::auth::CurrentUser;
use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    request.validate()?;

    let email = normalize_email(&request.email);
    let password_hash = state.auth.hash_password(request.password).await?;

    let user = state
        .users
        .create_user(NewUser {
            email,
            full_name: request.full_name.trim().to_string(),
            password_hash,
        })
        .await?;

    info!(user_id = user.id, "registered user");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(_caller): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .users
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user with id {id} not found")))?;

    Ok(Json(user.into()))
}
