//! # Auth Module
//!
//! Sign-in surfaces and sessions:
//! - Google ID token sign-in
//! - Email and password accounts with password reset
//! - JWT session issue and validation
//! - AuthedUser extractor for protected routes

pub mod credentials;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod passwords;
pub mod routes;
pub mod session;
pub mod validators;


pub use extractors::AuthedUser;
pub use routes::auth_routes;
