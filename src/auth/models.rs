//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::identity::models::AuthProviderLink;
use crate::profile::models::Profile;

/// JWT claims structure; `sub` is the profile id
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
}

/// Google ID token payload for OAuth
#[derive(Deserialize)]
pub struct GoogleIdTokenPayload {
    pub id_token: String,
}

/// Locally managed email/password account
#[derive(FromRow, Debug, Clone)]
pub struct CredentialUser {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    /// Set once the owner of `email` followed a confirmation or reset link
    pub verified_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl CredentialUser {
    pub fn is_verified(&self) -> bool {
        self.verified_at.is_some()
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProfile {
    pub id: String,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub onboarding_complete: bool,
}

impl From<Profile> for SessionProfile {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            email: profile.email,
            username: profile.username,
            full_name: profile.full_name,
            avatar_url: profile.avatar_url,
            onboarding_complete: profile.onboarding_complete,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub profile: SessionProfile,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub profile: Profile,
    pub providers: Vec<AuthProviderLink>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
