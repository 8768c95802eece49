// src/profile/handlers/cards.rs

use axum::extract::{Extension, Json, Path};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::super::display::PublicCard;
use super::super::service;
use crate::common::{ApiError, AppState};

/// GET /api/cards/:username - Card view with display-formatted follower counts
pub async fn get_card(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(username): Path<String>,
) -> Result<Json<PublicCard>, ApiError> {
    let state = state_lock.read().await.clone();

    let profile = service::get_public_profile(&state.profiles, &username).await?;
    debug!(profile_id = %profile.id, "Serving public card");

    Ok(Json(PublicCard::from(profile)))
}
