// src/services/rate_limit.rs
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::common::config::split_list;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub authenticated_limit: u32,
    pub anonymous_limit: u32,
    pub per_ip_limit: u32,
    pub window_seconds: u32,
    pub whitelist_ips: Vec<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            authenticated_limit: 100, // per window, keyed by bearer token
            anonymous_limit: 20,      // per window, keyed by client IP
            per_ip_limit: 50,
            window_seconds: 60,
            whitelist_ips: vec!["127.0.0.1".to_string(), "::1".to_string()],
        }
    }
}

impl RateLimitConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // RATE_LIMIT_ENABLED - set to "false" to disable rate limiting
        if let Ok(enabled) = env::var("RATE_LIMIT_ENABLED") {
            config.enabled = enabled.to_lowercase() != "false";
        }

        if let Some(val) = parse_var("RATE_LIMIT_AUTHENTICATED") {
            config.authenticated_limit = val;
        }

        if let Some(val) = parse_var("RATE_LIMIT_ANONYMOUS") {
            config.anonymous_limit = val;
        }

        if let Some(val) = parse_var("RATE_LIMIT_PER_IP") {
            config.per_ip_limit = val;
        }

        if let Some(val) = parse_var("RATE_LIMIT_WINDOW_SECONDS") {
            config.window_seconds = val;
        }

        // RATE_LIMIT_WHITELIST_IPS - comma-separated list of whitelisted IPs
        if let Ok(whitelist) = env::var("RATE_LIMIT_WHITELIST_IPS") {
            config.whitelist_ips = split_list(&whitelist);
        }

        config
    }
}

fn parse_var(key: &str) -> Option<u32> {
    env::var(key).ok().and_then(|v| v.parse::<u32>().ok())
}

#[derive(Debug, Clone)]
struct RateLimitState {
    count: u32,
    window_start: Instant,
}

impl RateLimitState {
    fn new() -> Self {
        Self {
            count: 0,
            window_start: Instant::now(),
        }
    }

    fn reset(&mut self) {
        self.count = 0;
        self.window_start = Instant::now();
    }

    fn is_expired(&self, window_duration: Duration) -> bool {
        self.window_start.elapsed() > window_duration
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed,
    Limited { retry_after: u32 },
}

/// Fixed-window limiter held in process memory
#[derive(Debug, Clone)]
pub struct RateLimitService {
    config: RateLimitConfig,
    rate_limiter: Arc<RwLock<HashMap<String, RateLimitState>>>,
}

impl RateLimitService {
    pub fn new(config: RateLimitConfig) -> Self {
        info!(
            enabled = config.enabled,
            authenticated_limit = config.authenticated_limit,
            anonymous_limit = config.anonymous_limit,
            per_ip_limit = config.per_ip_limit,
            window_seconds = config.window_seconds,
            whitelist_ips = ?config.whitelist_ips,
            "Initializing RateLimitService"
        );
        Self {
            config,
            rate_limiter: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn is_whitelisted(&self, ip: &str) -> bool {
        self.config.whitelist_ips.iter().any(|w| w == ip)
    }

    /// Counts one request for `identifier` (and for its IP, when known)
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        ip_address: Option<&str>,
        is_authenticated: bool,
    ) -> RateLimitResult {
        if !self.config.enabled {
            return RateLimitResult::Allowed;
        }

        if let Some(ip) = ip_address {
            if self.is_whitelisted(ip) {
                return RateLimitResult::Allowed;
            }
        }

        let limit = if is_authenticated {
            self.config.authenticated_limit
        } else {
            self.config.anonymous_limit
        };
        let window_duration = Duration::from_secs(self.config.window_seconds as u64);

        let user_result = self
            .check_limit_for_key(identifier, limit, window_duration)
            .await;
        if user_result != RateLimitResult::Allowed {
            return user_result;
        }

        if let Some(ip) = ip_address {
            let ip_key = format!("ip:{}", ip);
            return self
                .check_limit_for_key(&ip_key, self.config.per_ip_limit, window_duration)
                .await;
        }

        RateLimitResult::Allowed
    }

    async fn check_limit_for_key(
        &self,
        key: &str,
        limit: u32,
        window_duration: Duration,
    ) -> RateLimitResult {
        let mut limiter = self.rate_limiter.write().await;

        let state = limiter
            .entry(key.to_string())
            .or_insert_with(RateLimitState::new);

        if state.is_expired(window_duration) {
            state.reset();
        }

        if state.count >= limit {
            let elapsed = state.window_start.elapsed().as_secs() as u32;
            let retry_after = (window_duration.as_secs() as u32).saturating_sub(elapsed);
            return RateLimitResult::Limited {
                retry_after: retry_after.max(1),
            };
        }

        state.count += 1;
        RateLimitResult::Allowed
    }

    pub async fn log_violation(&self, identifier: &str, ip_address: Option<&str>, endpoint: &str) {
        warn!(
            identifier = %identifier,
            ip_address = ?ip_address,
            endpoint = %endpoint,
            "Rate limit violation detected"
        );
    }

    /// Drops windows that have run out
    pub async fn cleanup_expired(&self) {
        let window_duration = Duration::from_secs(self.config.window_seconds as u64);
        let mut limiter = self.rate_limiter.write().await;
        limiter.retain(|_, state| !state.is_expired(window_duration));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            authenticated_limit: 3,
            anonymous_limit: 2,
            per_ip_limit: 5,
            window_seconds: 60,
            whitelist_ips: vec!["127.0.0.1".to_string()],
        }
    }

    #[tokio::test]
    async fn test_rate_limit_blocks_when_exceeded() {
        let service = RateLimitService::new(small_config());

        for _ in 0..3 {
            assert_eq!(
                service.check_rate_limit("token:a", Some("10.0.0.1"), true).await,
                RateLimitResult::Allowed
            );
        }

        match service.check_rate_limit("token:a", Some("10.0.0.1"), true).await {
            RateLimitResult::Limited { retry_after } => assert!(retry_after >= 1 && retry_after <= 60),
            other => panic!("expected Limited, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_anonymous_limit_is_lower() {
        let service = RateLimitService::new(small_config());

        assert_eq!(service.check_rate_limit("anon:10.0.0.2", Some("10.0.0.2"), false).await, RateLimitResult::Allowed);
        assert_eq!(service.check_rate_limit("anon:10.0.0.2", Some("10.0.0.2"), false).await, RateLimitResult::Allowed);
        assert!(matches!(
            service.check_rate_limit("anon:10.0.0.2", Some("10.0.0.2"), false).await,
            RateLimitResult::Limited { .. }
        ));
    }

    #[tokio::test]
    async fn test_per_ip_limit_spans_identifiers() {
        let service = RateLimitService::new(small_config());

        for i in 0..5 {
            let id = format!("token:{}", i);
            assert_eq!(
                service.check_rate_limit(&id, Some("10.0.0.3"), true).await,
                RateLimitResult::Allowed
            );
        }

        assert!(matches!(
            service.check_rate_limit("token:fresh", Some("10.0.0.3"), true).await,
            RateLimitResult::Limited { .. }
        ));
    }

    #[tokio::test]
    async fn test_whitelist_and_disabled_bypass() {
        let service = RateLimitService::new(small_config());
        for _ in 0..10 {
            assert_eq!(
                service.check_rate_limit("anon:local", Some("127.0.0.1"), false).await,
                RateLimitResult::Allowed
            );
        }

        let mut config = small_config();
        config.enabled = false;
        let disabled = RateLimitService::new(config);
        for _ in 0..10 {
            assert_eq!(
                disabled.check_rate_limit("anon:x", Some("10.0.0.4"), false).await,
                RateLimitResult::Allowed
            );
        }
    }

    #[tokio::test]
    async fn test_cleanup_keeps_live_windows() {
        let service = RateLimitService::new(small_config());
        service.check_rate_limit("token:a", None, true).await;
        service.cleanup_expired().await;
        assert_eq!(service.rate_limiter.read().await.len(), 1);
    }
}
