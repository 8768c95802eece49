// Application state shared across all modules

use reqwest::Client;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::common::config::AppConfig;
use crate::services::{Mailer, RateLimitService};
use crate::store::SqliteProfileStore;

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub http: Client,
    pub config: AppConfig,
    pub profiles: SqliteProfileStore,
    pub mailer: Arc<dyn Mailer>,
    pub rate_limit_service: Arc<RateLimitService>,
}

impl AppState {
    pub fn new(db: SqlitePool, http: Client, config: AppConfig, mailer: Arc<dyn Mailer>) -> Self {
        let rate_limit_service = Arc::new(RateLimitService::new(config.rate_limit.clone()));
        Self {
            profiles: SqliteProfileStore::new(db.clone()),
            db,
            http,
            config,
            mailer,
            rate_limit_service,
        }
    }
}
