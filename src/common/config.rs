// src/common/config.rs
//! Runtime configuration loaded from the environment (and `.env` via dotenv)

use std::env;
use tracing::warn;

use crate::services::rate_limit::RateLimitConfig;

const DEFAULT_JWT_SECRET: &str = "replace_with_strong_secret";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub google_client_id: Option<String>,
    /// Public base URL used to build links in outgoing email
    pub app_url: String,
    pub cors_origins: Vec<String>,
    pub reset_db: bool,
    pub ses_from_email: Option<String>,
    pub ses_region: Option<String>,
    pub rate_limit: RateLimitConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://viracard.db".to_string(),
            port: 8080,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            session_ttl_hours: 24,
            google_client_id: None,
            app_url: "http://localhost:3000".to_string(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
            reset_db: false,
            ses_from_email: None,
            ses_region: None,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("DATABASE_URL") {
            config.database_url = url;
        }

        if let Some(port) = env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            config.port = port;
        }

        match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => config.jwt_secret = secret,
            _ => warn!("JWT_SECRET not set, using the insecure development default"),
        }

        if let Some(hours) = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|h| h.parse::<i64>().ok())
            .filter(|h| *h > 0)
        {
            config.session_ttl_hours = hours;
        }

        config.google_client_id = non_empty_var("GOOGLE_CLIENT_ID");

        if let Some(url) = non_empty_var("APP_URL") {
            config.app_url = url.trim_end_matches('/').to_string();
        }

        if let Ok(origins) = env::var("CORS_ORIGINS") {
            config.cors_origins = split_list(&origins);
        }

        config.reset_db = env::var("RESET_DB")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        config.ses_from_email = non_empty_var("AWS_SES_FROM_EMAIL");
        config.ses_region = non_empty_var("AWS_SES_REGION");
        config.rate_limit = RateLimitConfig::from_env();

        config
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Splits a comma-separated env value, dropping blanks
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.session_ttl_hours, 24);
        assert!(config.google_client_id.is_none());
        assert!(!config.reset_db);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(" http://a.test, ,http://b.test "),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(split_list("").is_empty());
    }
}
