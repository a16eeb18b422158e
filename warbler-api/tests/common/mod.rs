/// Common test utilities for API integration tests
///
/// Builds the full router over a fresh [`MemoryStore`] and offers small
/// helpers for sending JSON requests and reading JSON responses.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use warbler_api::app::{build_router, AppState};
use warbler_api::config::Config;
use warbler_shared::store::memory::MemoryStore;

pub const JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Test context holding the router under test
pub struct TestContext {
    pub app: Router,
}

impl TestContext {
    pub fn new() -> Self {
        let vars: HashMap<&str, &str> =
            HashMap::from([("STORAGE_BACKEND", "memory"), ("JWT_SECRET", JWT_SECRET)]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
            .expect("test configuration is valid");

        let state = AppState::new(Arc::new(MemoryStore::new()), config);
        Self {
            app: build_router(state),
        }
    }

    /// Sends a request and returns status and parsed JSON body
    ///
    /// Empty bodies parse as `Value::Null`.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    /// Registers `name` with password `<name>@password`, returning the token and user ID
    pub async fn register(&self, name: &str) -> (String, i64) {
        let (status, body) = self
            .send(
                "POST",
                "/v1/auth/register",
                None,
                Some(serde_json::json!({
                    "username": name,
                    "email": format!("{name}@example.org"),
                    "password": format!("{name}@password"),
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {name}: {body}");

        let token = body["token"].as_str().unwrap().to_string();
        let id = body["user"]["id"].as_i64().unwrap();
        (token, id)
    }

    /// Posts a tweet as the token holder, returning its ID
    pub async fn tweet(&self, token: &str, content: &str) -> i64 {
        let (status, body) = self
            .send(
                "POST",
                "/v1/tweets",
                Some(token),
                Some(serde_json::json!({ "content": content })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "tweet: {body}");
        body["id"].as_i64().unwrap()
    }
}

/// IDs of a JSON array of tweets, in order
pub fn ids(tweets: &Value) -> Vec<i64> {
    tweets
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect()
}
