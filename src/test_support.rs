//! Router-level helpers shared by handler tests.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::{
    app::build_app,
    config::AppConfig,
    state::AppState,
    users::{memory::InMemoryUserStore, repo::UserStore, repo_types::Role},
};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryUserStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::fake())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(InMemoryUserStore::new());
        let state = AppState::from_parts(store.clone() as Arc<dyn UserStore>, Arc::new(config));
        Self {
            router: build_app(state.clone()),
            state,
            store,
        }
    }

    pub fn make_admin(&self, id: i64) {
        self.store.with_user(id, |u| u.role = Role::Admin);
    }
}

pub async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
    };
    (status, value)
}

/// Creates a user through `POST /user` and returns its id.
pub async fn register(app: &TestApp, name: &str, email: &str, password: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/user",
        None,
        Some(json!({ "name": name, "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    body["payload"]["id"].as_i64().unwrap()
}

/// Logs in through `POST /login` and returns the access token.
pub async fn login(app: &TestApp, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["payload"]["accessToken"].as_str().unwrap().to_string()
}
