// src/profile/service.rs
//! Profile operations shared by the HTTP handlers

use tracing::{info, warn};

use super::models::{Profile, UpdateProfileRequest};
use super::validators::{to_profile_update, ProfileUpdateValidator};
use crate::common::{ApiError, Validator};
use crate::store::ProfileStore;

pub async fn get_public_profile<S: ProfileStore + ?Sized>(
    store: &S,
    username: &str,
) -> Result<Profile, ApiError> {
    store
        .get_profile_by_username(username.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))
}

/// Only the session subject may write to its own profile
pub fn ensure_owner(session_subject: &str, target_id: &str) -> Result<(), ApiError> {
    if session_subject != target_id {
        warn!(
            subject = %session_subject,
            target = %target_id,
            "Rejected profile update for a profile the session does not own"
        );
        return Err(ApiError::Unauthorized("Unauthorized".to_string()));
    }
    Ok(())
}

/// Updates the profile `target_id` on behalf of the session subject.
///
/// Only the owner may write: a mismatched subject is rejected before any
/// validation or store access. Success marks onboarding complete.
pub async fn update_own_profile<S: ProfileStore + ?Sized>(
    store: &S,
    session_subject: &str,
    target_id: &str,
    request: UpdateProfileRequest,
) -> Result<Profile, ApiError> {
    ensure_owner(session_subject, target_id)?;

    ProfileUpdateValidator.validate(&request).into_result()?;

    let update = to_profile_update(request);
    if !store.update_profile(target_id, &update).await? {
        return Err(ApiError::NotFound("Profile not found".to_string()));
    }

    info!(profile_id = %target_id, "Profile updated successfully");

    store
        .get_profile_by_id(target_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))
}
