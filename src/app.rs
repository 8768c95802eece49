// src/app.rs
//! Router composition shared by the server binary and router tests

use axum::{
    extract::Extension,
    http::{header, HeaderName, HeaderValue, Method},
    middleware, Router,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::common::AppState;
use crate::rate_limit_middleware::rate_limit_middleware;
use crate::{auth, logging_middleware, profile};

pub fn build_router(state: AppState) -> Router {
    let rate_limit_service = state.rate_limit_service.clone();
    let cors = cors_layer(&state.config.cors_origins);
    let shared = Arc::new(RwLock::new(state));

    Router::new()
        // ====================================================================
        // AUTHENTICATION ROUTES
        // ====================================================================
        .merge(auth::auth_routes())
        // ====================================================================
        // PROFILE ROUTES (Lookup, Cards, Updates)
        // ====================================================================
        .merge(profile::profile_routes())
        // ====================================================================
        // MIDDLEWARE AND LAYERS
        // ====================================================================
        .layer(middleware::from_fn(logging_middleware::log_request_response))
        .layer(middleware::from_fn(rate_limit_middleware))
        .layer(Extension(rate_limit_service))
        .layer(Extension(shared))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true)
}
