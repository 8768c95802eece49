// src/services/google.rs
//! Google ID token verification through the tokeninfo endpoint.
//! Docs: https://developers.google.com/identity/sign-in/web/backend-auth

use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

const TOKENINFO_ENDPOINT: &str = "https://oauth2.googleapis.com/tokeninfo";

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("id_token rejected by Google (status {0})")]
    Rejected(u16),

    #[error("malformed tokeninfo response: {0}")]
    Malformed(String),

    #[error("token missing required fields")]
    MissingFields,

    #[error("token has expired")]
    Expired,

    #[error("token audience mismatch")]
    AudienceMismatch,

    #[error("token email is not verified")]
    UnverifiedEmail,

    #[error("tokeninfo endpoint unavailable: {0}")]
    Unavailable(String),
}

/// Verified claims of a Google ID token
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleIdentity {
    pub sub: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

pub async fn verify_id_token(
    http: &Client,
    id_token: &str,
    client_id: Option<&str>,
) -> Result<GoogleIdentity, GoogleError> {
    debug!("Initiating Google token validation with tokeninfo endpoint");

    let response = http
        .get(TOKENINFO_ENDPOINT)
        .query(&[("id_token", id_token)])
        .send()
        .await
        .map_err(|e| {
            error!(
                error = %e,
                endpoint = TOKENINFO_ENDPOINT,
                "HTTP error contacting Google tokeninfo endpoint"
            );
            GoogleError::Unavailable(e.to_string())
        })?;

    let status = response.status();
    debug!(http_status = %status, "Received response from Google tokeninfo endpoint");

    if !status.is_success() {
        warn!(http_status = %status, "Google tokeninfo rejected the id_token");
        if status.is_server_error() {
            return Err(GoogleError::Unavailable(format!("status {}", status)));
        }
        return Err(GoogleError::Rejected(status.as_u16()));
    }

    let body = response
        .json::<Value>()
        .await
        .map_err(|e| GoogleError::Malformed(e.to_string()))?;

    validate_tokeninfo(&body, client_id, Utc::now().timestamp())
}

/// Checks a tokeninfo payload: required `sub`/`email`, expiry against `now`,
/// and the audience when a client id is configured.
///
/// Tokeninfo encodes numbers and booleans as strings, so both forms are accepted.
pub fn validate_tokeninfo(
    body: &Value,
    client_id: Option<&str>,
    now: i64,
) -> Result<GoogleIdentity, GoogleError> {
    let sub = string_field(body, "sub");
    let email = string_field(body, "email");

    let (sub, email) = match (sub, email) {
        (Some(sub), Some(email)) => (sub, email),
        (sub, email) => {
            warn!(
                has_email = email.is_some(),
                has_sub = sub.is_some(),
                "Google token missing required fields (email/sub)"
            );
            return Err(GoogleError::MissingFields);
        }
    };

    if let Some(exp) = int_field(body, "exp") {
        if exp < now {
            warn!(token_exp = exp, current_time = now, "Google token has expired");
            return Err(GoogleError::Expired);
        }
    }

    if let Some(client_id) = client_id {
        match string_field(body, "aud") {
            Some(aud) if aud == client_id => {
                debug!(token_audience = %aud, "Google token audience validation successful");
            }
            aud => {
                warn!(
                    token_audience = ?aud,
                    expected_client_id = %client_id,
                    "Google token audience validation failed - rejecting token"
                );
                return Err(GoogleError::AudienceMismatch);
            }
        }
    }

    if bool_field(body, "email_verified") == Some(false) {
        warn!(provider_id = %sub, "Google token contains unverified email address");
        return Err(GoogleError::UnverifiedEmail);
    }

    Ok(GoogleIdentity {
        sub,
        email,
        name: string_field(body, "name"),
        picture: string_field(body, "picture"),
    })
}

fn string_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn int_field(body: &Value, key: &str) -> Option<i64> {
    match body.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn bool_field(body: &Value, key: &str) -> Option<bool> {
    match body.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
