use axum::{
    Json, Router,
    http::HeaderValue,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::infra::app_state::AppState;
use crate::{auth, posts, users};

pub fn create_app(state: AppState) -> Router {
    let cors_layer = build_cors_layer(&state.config().cors_allowed_origins);

    Router::new()
        .route("/health", get(health_handler))
        .route("/login", post(auth::handlers::login))
        .route("/users", post(users::handlers::create_user))
        .route("/users/{id}", get(users::handlers::get_user))
        .route(
            "/posts",
            get(posts::handlers::list_posts).post(posts::handlers::create_post),
        )
        .route("/posts/my_posts", get(posts::handlers::my_posts))
        .route(
            "/posts/{id}",
            get(posts::handlers::get_post)
                .put(posts::handlers::update_post)
                .delete(posts::handlers::delete_post),
        )
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Allow-list when origins are configured, any origin otherwise.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::any())
        .allow_headers(AllowHeaders::any())
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
