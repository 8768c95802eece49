// src/profile/editor.rs
//! Editing session for the owner's card.
//!
//! This is the client-facing editing contract: the editor is seeded from a
//! stored profile, mutated locally and turned into the body a client sends to
//! `PATCH /api/profile`. The server never drives it, so nothing in the request
//! path constructs one. Nothing is shared: each session owns its own
//! `CardEditor`.

use chrono::Utc;

use super::models::{
    Platform, Profile, SocialLink, SocialLinkInput, UpdateProfileRequest, MAX_SOCIAL_LINKS,
};

#[allow(dead_code)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardDraft {
    pub tagline: String,
    pub social_links: Vec<SocialLink>,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialLinkField {
    Platform,
    Username,
    Followers,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct CardEditor {
    initial: CardDraft,
    current: CardDraft,
}

#[allow(dead_code)]
impl CardEditor {
    pub fn new(profile: &Profile) -> Self {
        let draft = CardDraft {
            tagline: profile.tagline.clone().unwrap_or_default(),
            social_links: profile.social_links.clone(),
        };
        Self {
            initial: draft.clone(),
            current: draft,
        }
    }

    pub fn card(&self) -> &CardDraft {
        &self.current
    }

    pub fn set_tagline(&mut self, tagline: impl Into<String>) {
        self.current.tagline = tagline.into();
    }

    /// Appends an empty Instagram link and returns its id.
    /// Returns `None` once the card already holds the maximum number of links.
    pub fn add_social_link(&mut self) -> Option<String> {
        if self.current.social_links.len() >= MAX_SOCIAL_LINKS {
            return None;
        }

        let id = self.next_link_id();
        self.current.social_links.push(SocialLink {
            id: id.clone(),
            platform: Platform::Instagram,
            username: String::new(),
            followers: String::new(),
        });
        Some(id)
    }

    pub fn remove_social_link(&mut self, id: &str) -> bool {
        let before = self.current.social_links.len();
        self.current.social_links.retain(|link| link.id != id);
        self.current.social_links.len() != before
    }

    /// Sets one field of the link `id`. Unknown ids and unknown platform
    /// names leave the draft untouched and return `false`.
    pub fn update_social_link(&mut self, id: &str, field: SocialLinkField, value: &str) -> bool {
        let link = match self.current.social_links.iter_mut().find(|l| l.id == id) {
            Some(link) => link,
            None => return false,
        };

        match field {
            SocialLinkField::Platform => match value.parse::<Platform>() {
                Ok(platform) => link.platform = platform,
                Err(()) => return false,
            },
            SocialLinkField::Username => link.username = value.to_string(),
            SocialLinkField::Followers => link.followers = value.to_string(),
        }
        true
    }

    pub fn cancel(&mut self) {
        self.current = self.initial.clone();
    }

    pub fn is_dirty(&self) -> bool {
        self.current != self.initial
    }

    pub fn to_update_request(&self) -> UpdateProfileRequest {
        UpdateProfileRequest {
            tagline: Some(self.current.tagline.clone()),
            social_links: Some(
                self.current
                    .social_links
                    .iter()
                    .map(|link| SocialLinkInput {
                        id: link.id.clone(),
                        platform: link.platform.to_string(),
                        username: link.username.clone(),
                        followers: link.followers.clone(),
                    })
                    .collect(),
            ),
        }
    }

    // Millisecond timestamp, bumped while it collides with an existing link
    fn next_link_id(&self) -> String {
        let mut candidate = Utc::now().timestamp_millis();
        while self
            .current
            .social_links
            .iter()
            .any(|link| link.id == candidate.to_string())
        {
            candidate += 1;
        }
        candidate.to_string()
    }
}
