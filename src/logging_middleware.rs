// src/logging_middleware.rs
//! Middleware for logging request and response bodies in debug mode

use axum::body::to_bytes;
use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use tracing::debug;

/// JSON keys whose values never reach the log
const REDACTED_FIELDS: [&str; 5] = ["password", "confirmPassword", "token", "id_token", "idToken"];

/// Middleware to log request and response bodies in debug mode
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();

    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if let Some(body_str) = loggable_body(&bytes) {
        debug!(
            method = %parts.method,
            uri = %parts.uri,
            request_body = %body_str,
            "📥 Request"
        );
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if let Some(body_str) = loggable_body(&bytes) {
        debug!(
            status = %parts.status,
            response_body = %body_str,
            "📤 Response"
        );
    }

    Ok(Response::from_parts(parts, Body::from(bytes)))
}

fn loggable_body(bytes: &Bytes) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    let body_str = std::str::from_utf8(bytes).ok()?;

    match serde_json::from_str::<Value>(body_str) {
        Ok(mut json) => {
            redact(&mut json);
            Some(serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string()))
        }
        Err(_) => Some(body_str.to_string()),
    }
}

fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *field = Value::String("[REDACTED]".to_string());
                } else {
                    redact(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redacts_secrets_at_any_depth() {
        let mut body = json!({
            "email": "jane@example.com",
            "password": "hunter22",
            "nested": { "token": "abc", "keep": 1 },
            "list": [{ "confirmPassword": "hunter22" }]
        });
        redact(&mut body);

        assert_eq!(body["email"], "jane@example.com");
        assert_eq!(body["password"], "[REDACTED]");
        assert_eq!(body["nested"]["token"], "[REDACTED]");
        assert_eq!(body["nested"]["keep"], 1);
        assert_eq!(body["list"][0]["confirmPassword"], "[REDACTED]");
    }

    #[test]
    fn test_non_json_body_logged_verbatim() {
        let body = Bytes::from_static(b"plain text");
        assert_eq!(loggable_body(&body).as_deref(), Some("plain text"));
        assert_eq!(loggable_body(&Bytes::new()), None);
    }
}
