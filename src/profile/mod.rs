// src/profile/mod.rs

pub mod display;
pub mod editor;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod service;
pub mod validators;

#[cfg(test)]
mod tests;

pub use routes::profile_routes;
