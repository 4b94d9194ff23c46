/// Common test utilities for integration tests
///
/// Every `TestContext` owns a private in-memory SQLite database with
/// migrations applied, so tests can run in parallel without cleanup.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use moonphase_api::app::{build_router, AppState};
use moonphase_api::config::Config;
use moonphase_shared::db::migrations::run_migrations;
use moonphase_shared::db::pool::{create_pool, DatabaseConfig, DbPool};
use moonphase_shared::lunar::ephemeris::Ephemeris;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::Service as _;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";
pub const TEST_RENDER_SIZE: u32 = 120;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: DbPool,
    pub app: Router,
    pub config: Config,
}

impl TestContext {
    /// Creates a context backed by the default ephemeris
    pub async fn new() -> anyhow::Result<Self> {
        Self::build(None).await
    }

    /// Creates a context with a substitute ephemeris provider
    pub async fn with_ephemeris(ephemeris: Arc<dyn Ephemeris>) -> anyhow::Result<Self> {
        Self::build(Some(ephemeris)).await
    }

    async fn build(ephemeris: Option<Arc<dyn Ephemeris>>) -> anyhow::Result<Self> {
        let vars: HashMap<&str, String> = HashMap::from([
            ("DATABASE_URL", "sqlite::memory:".to_string()),
            ("JWT_SECRET", TEST_SECRET.to_string()),
            ("RENDER_SIZE", TEST_RENDER_SIZE.to_string()),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).cloned())?;

        let db = create_pool(DatabaseConfig::in_memory()).await?;
        run_migrations(&db).await?;

        let state = match ephemeris {
            Some(ephemeris) => AppState::with_ephemeris(db.clone(), config.clone(), ephemeris),
            None => AppState::new(db.clone(), config.clone()),
        };
        let app = build_router(state);

        Ok(TestContext { db, app, config })
    }

    /// Sends a request and returns the status and parsed JSON body
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        authorization: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .call(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body: {}", String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    pub async fn register(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/register",
            Some(json!({ "username": username, "password": password })),
            None,
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/login",
            Some(json!({ "username": username, "password": password })),
            None,
        )
        .await
    }

    /// Registers and logs in, returning the bearer token
    pub async fn register_and_login(&self, username: &str, password: &str) -> String {
        let (status, _) = self.register(username, password).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self.login(username, password).await;
        assert_eq!(status, StatusCode::OK);

        body["token"].as_str().expect("token in login response").to_string()
    }

    pub async fn moon_phase(&self, token: &str, date: &str) -> (StatusCode, Value) {
        self.moon_phase_with_header(&format!("Bearer {}", token), json!({ "date": date }))
            .await
    }

    pub async fn moon_phase_with_header(
        &self,
        authorization: &str,
        body: Value,
    ) -> (StatusCode, Value) {
        self.send(Method::POST, "/get-moon-phase", Some(body), Some(authorization))
            .await
    }
}
