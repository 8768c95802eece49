// src/profile/handlers/profile.rs

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Json, Path, Query};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::super::models::{Profile, ProfileLookupQuery, PublicProfile};
use super::super::service;
use super::super::validators::parse_update_request;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};

/// GET /api/profile?username= - Public profile lookup
pub async fn get_profile_by_username(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(query): Query<ProfileLookupQuery>,
) -> Result<Json<PublicProfile>, ApiError> {
    let state = state_lock.read().await.clone();

    let username = query
        .username
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Username is required".to_string()))?;

    let profile = service::get_public_profile(&state.profiles, &username).await?;
    Ok(Json(PublicProfile::from(profile)))
}

/// PATCH /api/profile - Update the caller's own profile
pub async fn update_profile_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Profile>, ApiError> {
    let state = state_lock.read().await.clone();

    info!(profile_id = %authed.id, "Profile update request received");

    let Json(body) = payload?;
    let request = parse_update_request(body)?;

    let profile =
        service::update_own_profile(&state.profiles, &authed.id, &authed.id, request).await?;
    Ok(Json(profile))
}

/// PATCH /api/profiles/:id - Update a profile by id; only its owner may do so
pub async fn update_profile_by_id(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(profile_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Profile>, ApiError> {
    let state = state_lock.read().await.clone();

    info!(
        profile_id = %profile_id,
        subject = %authed.id,
        "Profile update by id request received"
    );

    // Ownership is settled before the body is looked at
    service::ensure_owner(&authed.id, &profile_id)?;
    let Json(body) = payload?;
    let request = parse_update_request(body)?;

    let profile =
        service::update_own_profile(&state.profiles, &authed.id, &profile_id, request).await?;
    Ok(Json(profile))
}
