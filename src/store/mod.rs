//! # Store Module
//!
//! Read/write boundary over profiles and their provider links. The identity
//! resolver and the profile handlers only talk to the [`ProfileStore`] trait;
//! [`SqliteProfileStore`] is the production implementation.
//!
//! Inserts must surface unique-constraint violations as
//! [`StoreError::Conflict`] instead of overwriting: the resolver treats a
//! conflict as "someone else won the race" and re-reads.

pub mod sqlite;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::identity::models::AuthProviderLink;
use crate::profile::models::{NewProfile, Profile, ProfileUpdate};

pub use sqlite::SqliteProfileStore;

/// Which uniqueness rule an insert ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictTarget {
    ProfileId,
    Email,
    Username,
    ProviderAccount,
    Other,
}

impl fmt::Display for ConflictTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConflictTarget::ProfileId => "profile id",
            ConflictTarget::Email => "email",
            ConflictTarget::Username => "username",
            ConflictTarget::ProviderAccount => "provider account",
            ConflictTarget::Other => "unknown key",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated on {0}")]
    Conflict(ConflictTarget),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn conflict_target(&self) -> Option<ConflictTarget> {
        match self {
            StoreError::Conflict(target) => Some(*target),
            StoreError::Database(_) => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile_by_username(&self, username: &str) -> StoreResult<Option<Profile>>;

    async fn get_profile_by_id(&self, id: &str) -> StoreResult<Option<Profile>>;

    /// Applies the update and marks onboarding complete. Returns `false` when no
    /// profile has this id.
    async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> StoreResult<bool>;

    async fn find_profile_by_email(&self, email: &str) -> StoreResult<Option<Profile>>;

    /// Case-insensitive count of usernames starting with `prefix`
    async fn count_usernames_with_prefix(&self, prefix: &str) -> StoreResult<i64>;

    async fn insert_profile(&self, profile: &NewProfile) -> StoreResult<Profile>;

    /// Overwrites whichever of the display fields are `Some`
    async fn update_display_metadata(
        &self,
        id: &str,
        full_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> StoreResult<()>;

    async fn find_auth_link(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> StoreResult<Option<AuthProviderLink>>;

    async fn insert_auth_link(
        &self,
        provider: &str,
        provider_user_id: &str,
        user_id: &str,
    ) -> StoreResult<()>;

    async fn list_auth_links(&self, user_id: &str) -> StoreResult<Vec<AuthProviderLink>>;
}
