// src/identity/resolver.rs
//! Maps a sign-in attempt to exactly one profile id.
//!
//! 1. Reject attempts without an email or provider account id.
//! 2. Known `(provider, provider_user_id)` link: return its profile.
//! 3. Otherwise find the profile by email (linking a new provider), or create
//!    one with a username derived from the email local part.
//! 4. Record the provider link and return the profile id.
//!
//! Uniqueness constraints are the only concurrency control. An email or
//! provider-link conflict means a concurrent sign-in won the race, so the
//! whole resolution restarts from step 2. Username and id collisions are
//! re-probed in place.

use thiserror::Error;
use tracing::{debug, info, warn};

use super::models::SignInAttempt;
use super::username::{base_username, with_suffix};
use crate::common::{generate_profile_id, normalize_email, safe_email_log};
use crate::profile::models::{NewProfile, Profile};
use crate::store::{ConflictTarget, ProfileStore, StoreError};

/// Full resolutions tried before a conflicting sign-in gives up
pub const MAX_RESOLVE_ATTEMPTS: u32 = 3;

/// Profile inserts tried while stepping past taken usernames
pub const MAX_USERNAME_PROBES: u32 = 8;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("sign-in attempt is missing an email or provider account id")]
    IdentityIncomplete,

    #[error("could not create profile: {0}")]
    ProfileCreationFailed(#[source] StoreError),

    #[error("could not link provider account: {0}")]
    LinkCreationFailed(#[source] StoreError),

    #[error("profile store error: {0}")]
    Store(#[from] StoreError),
}

impl IdentityError {
    /// True when a concurrent sign-in won a uniqueness race
    pub fn is_retryable(&self) -> bool {
        match self {
            IdentityError::ProfileCreationFailed(e) | IdentityError::LinkCreationFailed(e) => {
                matches!(
                    e.conflict_target(),
                    Some(ConflictTarget::Email | ConflictTarget::ProviderAccount)
                )
            }
            _ => false,
        }
    }
}

pub struct IdentityResolver<'a, S: ?Sized> {
    store: &'a S,
    max_attempts: u32,
}

impl<'a, S: ProfileStore + ?Sized> IdentityResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            max_attempts: MAX_RESOLVE_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Returns the profile id to embed as the session subject
    pub async fn resolve(&self, attempt: &SignInAttempt) -> Result<String, IdentityError> {
        let provider = attempt.identity.provider().trim();
        let provider_user_id = attempt.identity.provider_user_id().trim();
        let email = attempt
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|e| !e.is_empty());

        let email = match email {
            Some(email) if !provider.is_empty() && !provider_user_id.is_empty() => email,
            _ => {
                warn!(
                    provider = %provider,
                    has_email = attempt.email.is_some(),
                    has_provider_user_id = !provider_user_id.is_empty(),
                    "Rejecting sign-in with incomplete identity"
                );
                return Err(IdentityError::IdentityIncomplete);
            }
        };

        let mut attempt_no = 1;
        loop {
            match self
                .resolve_once(provider, provider_user_id, &email, attempt)
                .await
            {
                Ok(profile_id) => return Ok(profile_id),
                Err(err) if err.is_retryable() && attempt_no < self.max_attempts => {
                    warn!(
                        error = %err,
                        attempt = attempt_no,
                        provider = %provider,
                        email = %safe_email_log(&email),
                        "Sign-in raced a concurrent request, retrying resolution"
                    );
                    attempt_no += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn resolve_once(
        &self,
        provider: &str,
        provider_user_id: &str,
        email: &str,
        attempt: &SignInAttempt,
    ) -> Result<String, IdentityError> {
        if let Some(link) = self
            .store
            .find_auth_link(provider, provider_user_id)
            .await?
        {
            debug!(
                provider = %provider,
                profile_id = %link.user_id,
                "Known provider account, reusing linked profile"
            );
            self.refresh_display_metadata(&link.user_id, attempt).await;
            return Ok(link.user_id);
        }

        let profile_id = match self.store.find_profile_by_email(email).await? {
            Some(existing) => {
                info!(
                    provider = %provider,
                    profile_id = %existing.id,
                    email = %safe_email_log(email),
                    "Linking new provider account to existing profile"
                );
                self.refresh_display_metadata(&existing.id, attempt).await;
                existing.id
            }
            None => self.create_profile(email, attempt).await?.id,
        };

        self.store
            .insert_auth_link(provider, provider_user_id, &profile_id)
            .await
            .map_err(IdentityError::LinkCreationFailed)?;

        info!(
            provider = %provider,
            profile_id = %profile_id,
            "Provider account linked"
        );

        Ok(profile_id)
    }

    async fn create_profile(
        &self,
        email: &str,
        attempt: &SignInAttempt,
    ) -> Result<Profile, IdentityError> {
        let base = base_username(email);
        // Advisory only: another request may claim the same name before our insert
        let mut suffix = self.store.count_usernames_with_prefix(&base).await?;
        let mut id = generate_profile_id();

        for _ in 0..MAX_USERNAME_PROBES {
            let new_profile = NewProfile {
                id: id.clone(),
                email: email.to_string(),
                username: with_suffix(&base, suffix),
                full_name: non_blank(attempt.display_name.as_deref()).map(str::to_string),
                avatar_url: non_blank(attempt.avatar_url.as_deref()).map(str::to_string),
            };

            match self.store.insert_profile(&new_profile).await {
                Ok(profile) => {
                    info!(
                        profile_id = %profile.id,
                        username = %profile.username,
                        email = %safe_email_log(email),
                        "Created profile for new sign-in"
                    );
                    return Ok(profile);
                }
                Err(StoreError::Conflict(ConflictTarget::Username)) => {
                    debug!(username = %new_profile.username, "Username taken, probing next suffix");
                    suffix += 1;
                }
                Err(StoreError::Conflict(ConflictTarget::ProfileId)) => {
                    id = generate_profile_id();
                }
                Err(err) => return Err(IdentityError::ProfileCreationFailed(err)),
            }
        }

        Err(IdentityError::ProfileCreationFailed(StoreError::Conflict(
            ConflictTarget::Username,
        )))
    }

    /// Display fields follow whichever provider signed in last; failures never block sign-in
    async fn refresh_display_metadata(&self, profile_id: &str, attempt: &SignInAttempt) {
        let full_name = non_blank(attempt.display_name.as_deref());
        let avatar_url = non_blank(attempt.avatar_url.as_deref());
        if full_name.is_none() && avatar_url.is_none() {
            return;
        }

        if let Err(e) = self
            .store
            .update_display_metadata(profile_id, full_name, avatar_url)
            .await
        {
            warn!(error = %e, profile_id = %profile_id, "Failed to refresh profile display metadata");
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
