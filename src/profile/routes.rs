// src/profile/routes.rs

use axum::{
    routing::{get, patch},
    Router,
};

use super::handlers::{cards, profile};

pub fn profile_routes() -> Router {
    Router::new()
        .route(
            "/api/profile",
            get(profile::get_profile_by_username).patch(profile::update_profile_handler),
        )
        .route("/api/profiles/:id", patch(profile::update_profile_by_id))
        .route("/api/cards/:username", get(cards::get_card))
}
