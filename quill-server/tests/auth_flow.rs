use anyhow::Result;
use axum::http::StatusCode;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{Value, json};
use std::time::Duration;

#[path = "support/mod.rs"]
mod support;
use support::{bearer, build_test_app};

#[tokio::test]
async fn register_then_login_issues_bearer_token() -> Result<()> {
    let app = build_test_app()?;
    let id = app.register("a@x.com", "pw1").await;

    let response = app
        .server
        .post("/login")
        .form(&[("username", "a@x.com"), ("password", "pw1")])
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().expect("token");

    let me = app
        .server
        .get(&format!("/users/{id}"))
        .add_header("Authorization", bearer(token))
        .await;
    me.assert_status_ok();
    let user: Value = me.json();
    assert_eq!(user["email"], "a@x.com");
    assert!(user.get("password").is_none());
    assert!(user.get("password_hash").is_none());
    Ok(())
}

#[tokio::test]
async fn login_email_is_case_insensitive() -> Result<()> {
    let app = build_test_app()?;
    app.register("Mixed@X.com", "pw1").await;
    let token = app.login("mixed@x.COM", "pw1").await;
    assert!(!token.is_empty());
    Ok(())
}

#[tokio::test]
async fn bad_credentials_are_always_401() -> Result<()> {
    let app = build_test_app()?;
    app.register("a@x.com", "pw1").await;

    for (email, password) in [("a@x.com", "wrong"), ("nobody@x.com", "pw1")] {
        let response = app
            .server
            .post("/login")
            .form(&[("username", email), ("password", password)])
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["error"]["message"], "Invalid Credentials");
        assert_eq!(response.header("www-authenticate"), "Bearer");
    }
    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts() -> Result<()> {
    let app = build_test_app()?;
    app.register("a@x.com", "pw1").await;

    let response = app
        .server
        .post("/users")
        .json(&json!({
            "email": "A@x.com",
            "password": "pw2",
            "full_name": "Someone Else"
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn invalid_registration_is_unprocessable() -> Result<()> {
    let app = build_test_app()?;
    let response = app
        .server
        .post("/users")
        .json(&json!({
            "email": "not-an-email",
            "password": "pw1",
            "full_name": "Someone"
        }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}

#[tokio::test]
async fn protected_routes_reject_missing_or_garbage_tokens() -> Result<()> {
    let app = build_test_app()?;
    let id = app.register("a@x.com", "pw1").await;

    let missing = app.server.get(&format!("/users/{id}")).await;
    missing.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(missing.header("www-authenticate"), "Bearer");
    let body: Value = missing.json();
    assert_eq!(body["error"]["message"], "Could not validate credentials");

    let garbage = app
        .server
        .get(&format!("/users/{id}"))
        .add_header("Authorization", bearer("not.a.jwt"))
        .await;
    garbage.assert_status(StatusCode::UNAUTHORIZED);

    let wrong_scheme = app
        .server
        .get(&format!("/users/{id}"))
        .add_header("Authorization", "Basic YTpi")
        .await;
    wrong_scheme.assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn expired_token_is_rejected() -> Result<()> {
    let app = build_test_app()?;
    let id = app.register("a@x.com", "pw1").await;

    let issued_at = Utc::now() - ChronoDuration::minutes(16);
    let stale = app
        .auth
        .codec()
        .issue_at(id, Some(Duration::from_secs(15 * 60)), issued_at)?;

    let response = app
        .server
        .get(&format!("/users/{id}"))
        .add_header("Authorization", bearer(&stale.token))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn token_for_unknown_or_deleted_user_is_rejected() -> Result<()> {
    let app = build_test_app()?;
    let id = app.register("gone@x.com", "pw1").await;
    let token = app.login("gone@x.com", "pw1").await;

    let ghost = app.auth.issue_access_token(9_999, None)?;
    let response = app
        .server
        .get(&format!("/users/{id}"))
        .add_header("Authorization", bearer(&ghost.token))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    assert!(app.store.delete_user(id));
    let response = app
        .server
        .get("/posts/my_posts")
        .add_header("Authorization", bearer(&token))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn missing_user_lookup_is_404_for_authenticated_caller() -> Result<()> {
    let app = build_test_app()?;
    app.register("a@x.com", "pw1").await;
    let token = app.login("a@x.com", "pw1").await;

    let response = app
        .server
        .get("/users/424242")
        .add_header("Authorization", bearer(&token))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    Ok(())
}
