//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::session::decode_session_token;
use crate::common::{safe_email_log, ApiError, AppState};
use crate::store::ProfileStore;

/// Authenticated profile extractor
///
/// Validates the session JWT and requires the profile it names to still exist.
#[derive(Debug)]
pub struct AuthedUser {
    pub id: String,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let app_state = state_lock.read().await.clone();

        let token = match parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
        {
            Some(t) => t,
            None => {
                warn!("Authentication failed: missing Authorization header");
                return Err(ApiError::Unauthorized("missing auth".into()));
            }
        };

        // Handle "Bearer <token>" format or raw token
        let bare_token = token.strip_prefix("Bearer ").unwrap_or(token).trim();

        let claims = decode_session_token(&app_state.config.jwt_secret, bare_token).map_err(|e| {
            warn!(error = %e, "JWT token validation failed");
            ApiError::Unauthorized("invalid token".into())
        })?;

        match app_state.profiles.get_profile_by_id(&claims.sub).await? {
            Some(profile) => {
                debug!(
                    profile_id = %profile.id,
                    email = %safe_email_log(&profile.email),
                    "Profile authentication successful via extractor"
                );
                Ok(AuthedUser {
                    id: profile.id,
                    email: profile.email,
                })
            }
            None => {
                warn!(profile_id = %claims.sub, "Authentication failed: profile not found");
                Err(ApiError::Unauthorized("user not found".into()))
            }
        }
    }
}
