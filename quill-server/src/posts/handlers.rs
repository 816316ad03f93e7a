use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use quill_core::auth::authorize_resource;
use quill_core::domain::{PostInput, PostQuery, PostResponse};
use tracing::info;

use crate::auth::CurrentUser;
use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

fn post_label(id: i64) -> String {
    format!("Post with id {id}")
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostQuery>,
) -> AppResult<Json<Vec<PostResponse>>> {
    Ok(Json(state.posts.list_posts(&query).await?))
}

pub async fn my_posts(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
) -> AppResult<Json<Vec<PostResponse>>> {
    Ok(Json(state.posts.list_posts_by_owner(me.id).await?))
}

pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Json(input): Json<PostInput>,
) -> AppResult<(StatusCode, Json<PostResponse>)> {
    let post = state.posts.create_post(me.id, input).await?;
    info!(post_id = post.id, user_id = me.id, "created post");
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    State(state): State<AppState>,
    CurrentUser(_caller): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<PostResponse>> {
    let post = state
        .posts
        .get_post(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("{} not found", post_label(id))))?;
    Ok(Json(post))
}

pub async fn update_post(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<PostInput>,
) -> AppResult<Json<PostResponse>> {
    let existing = state.posts.get_post(id).await?;
    authorize_resource(existing, &me, || post_label(id))?;

    // A concurrent delete between the check and the write still reads as 404.
    let updated = state
        .posts
        .update_post(id, input)
        .await?
        .ok_or_else(|| AppError::not_found(format!("{} not found", post_label(id))))?;
    info!(post_id = id, user_id = me.id, "updated post");
    Ok(Json(updated))
}

pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let existing = state.posts.get_post(id).await?;
    authorize_resource(existing, &me, || post_label(id))?;

    if !state.posts.delete_post(id).await? {
        return Err(AppError::not_found(format!("{} not found", post_label(id))));
    }
    info!(post_id = id, user_id = me.id, "deleted post");
    Ok(StatusCode::NO_CONTENT)
}
