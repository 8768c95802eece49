// src/profile/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

pub const MAX_TAGLINE_CHARS: usize = 100;
pub const MAX_SOCIAL_LINKS: usize = 4;
pub const MAX_SOCIAL_USERNAME_CHARS: usize = 50;
pub const MAX_FOLLOWERS_CHARS: usize = 20;

// ============================================================================
// Social Links
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Tiktok,
    Youtube,
    X,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Instagram,
        Platform::Tiktok,
        Platform::Youtube,
        Platform::X,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::Youtube => "youtube",
            Platform::X => "x",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub id: String,
    pub platform: Platform,
    pub username: String,
    /// Free text on purpose: partially typed input and "10.5k" style values are kept as-is
    pub followers: String,
}

/// Social link as submitted by a client, before validation. Every field is required.
#[derive(Debug, Clone, Deserialize)]
pub struct SocialLinkInput {
    pub id: String,
    pub platform: String,
    pub username: String,
    pub followers: String,
}

// ============================================================================
// Profile Models
// ============================================================================

#[derive(FromRow, Debug)]
pub struct ProfileRow {
    pub id: String,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub tagline: Option<String>,
    pub social_links: String, // JSON array of SocialLink
    pub onboarding_complete: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub tagline: Option<String>,
    pub social_links: Vec<SocialLink>,
    pub onboarding_complete: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        let social_links = serde_json::from_str(&row.social_links).unwrap_or_else(|e| {
            warn!(error = %e, profile_id = %row.id, "Stored social links are malformed, ignoring");
            Vec::new()
        });

        Self {
            id: row.id,
            email: row.email,
            username: row.username,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
            tagline: row.tagline,
            social_links,
            onboarding_complete: row.onboarding_complete,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Fields written when the identity resolver creates a profile
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: String,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Validated profile update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub tagline: Option<String>,
    pub social_links: Option<Vec<SocialLink>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub tagline: Option<String>,
    pub social_links: Option<Vec<SocialLinkInput>>,
}

/// Public view returned by `GET /api/profile?username=`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: String,
    pub full_name: Option<String>,
    pub tagline: Option<String>,
    pub avatar_url: Option<String>,
    pub social_links: Vec<SocialLink>,
    pub username: String,
}

impl From<Profile> for PublicProfile {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            full_name: profile.full_name,
            tagline: profile.tagline,
            avatar_url: profile.avatar_url,
            social_links: profile.social_links,
            username: profile.username,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileLookupQuery {
    pub username: Option<String>,
}
