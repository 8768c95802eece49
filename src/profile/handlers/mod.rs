// src/profile/handlers/mod.rs

pub mod cards;
pub mod profile;
