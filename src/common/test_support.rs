//! Shared fixtures for unit and router tests

use axum::{body::Body, http::Request, Router};
use http_body_util::BodyExt;
use reqwest::Client;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceExt;

use super::{migrations::run_migrations, AppConfig, AppState};
use crate::services::email::{MailError, Mailer};

pub const TEST_JWT_SECRET: &str = "test_secret_key";

/// Single-connection in-memory database; every pooled connection to
/// `sqlite::memory:` would otherwise see its own empty database.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    run_migrations(&pool, false).await.unwrap();
    pool
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Mailer that records messages instead of sending them
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentMail>>,
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        self.sent.lock().await.push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.jwt_secret = TEST_JWT_SECRET.to_string();
    config.app_url = "http://app.test".to_string();
    config.rate_limit.enabled = false;
    config
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
}

pub async fn spawn_app() -> TestApp {
    let pool = setup_test_db().await;
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::new(pool, Client::new(), test_config(), mailer.clone());
    let router = crate::app::build_router(state.clone());

    TestApp {
        router,
        state,
        mailer,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (axum::http::StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };

        (status, json)
    }
}
