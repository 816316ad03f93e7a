#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum_test::TestServer;
use quill_core::auth::{AuthCore, PasswordParams};
use quill_core::database::InMemoryDatabase;
use quill_server::create_app;
use quill_server::infra::{app_state::AppState, config::Config};
use serde_json::{Value, json};

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<InMemoryDatabase>,
    /// Shares the server's signing key, for forging edge-case tokens.
    pub auth: AuthCore,
}

pub fn build_test_app() -> Result<TestApp> {
    let config = Config::from_lookup(|key| match key {
        "SECRET_KEY" => Some(TEST_SECRET.to_string()),
        _ => None,
    })?;
    let settings = config
        .auth
        .clone()
        .with_password_params(PasswordParams::minimal());
    let auth = AuthCore::new(&settings)?;

    let store = Arc::new(InMemoryDatabase::new());
    let state = AppState::new(store.clone(), auth.clone(), config);
    let server = TestServer::builder()
        .build(create_app(state))
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;

    Ok(TestApp {
        server,
        store,
        auth,
    })
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

impl TestApp {
    /// Register and return the created user's id.
    pub async fn register(&self, email: &str, password: &str) -> i64 {
        let response = self
            .server
            .post("/users")
            .json(&json!({
                "email": email,
                "password": password,
                "full_name": "Test User"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        body["id"].as_i64().expect("id present")
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .server
            .post("/login")
            .form(&[("username", email), ("password", password)])
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        body["access_token"]
            .as_str()
            .expect("access_token present")
            .to_string()
    }

    pub async fn create_post(&self, token: &str, title: &str) -> i64 {
        let response = self
            .server
            .post("/posts")
            .add_header("Authorization", bearer(token))
            .json(&json!({ "title": title, "content": "body" }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        body["id"].as_i64().expect("id present")
    }
}
