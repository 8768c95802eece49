//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /api/auth/google` - Google OAuth authentication
/// - `POST /api/auth/register` - Create a credentials account (or sign in to a confirmed one)
/// - `POST /api/auth/verify-email` - Confirm a new account's email and sign in
/// - `POST /api/auth/login` - Email and password sign-in
/// - `POST /api/auth/forgot-password` - Request a password reset email
/// - `POST /api/auth/reset-password` - Set a new password with a reset token
/// - `POST /api/auth/logout` - Logout (client-side token removal)
/// - `GET /api/me` - Current profile and linked providers
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/auth/google", post(handlers::google_auth))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/verify-email", post(handlers::verify_email))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/forgot-password", post(handlers::forgot_password))
        .route("/api/auth/reset-password", post(handlers::reset_password))
        .route("/api/auth/logout", post(handlers::logout_handler))
        .route("/api/me", get(handlers::me_handler))
}
