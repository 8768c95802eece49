// src/profile/display.rs
//! Public card view of a profile

use serde::Serialize;

use super::models::{Platform, Profile};

const DEFAULT_CARD_NAME: &str = "User";

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CardLink {
    pub platform: Platform,
    pub username: String,
    pub followers: String,
    pub followers_display: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicCard {
    pub id: String,
    pub name: String,
    pub tagline: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub social_links: Vec<CardLink>,
}

impl From<Profile> for PublicCard {
    fn from(profile: Profile) -> Self {
        let name = profile
            .full_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CARD_NAME.to_string());

        let social_links = profile
            .social_links
            .into_iter()
            .map(|link| CardLink {
                platform: link.platform,
                followers_display: format_followers(&link.followers),
                username: link.username,
                followers: link.followers,
            })
            .collect();

        Self {
            id: profile.id,
            name,
            tagline: profile.tagline.unwrap_or_default(),
            username: profile.username,
            avatar_url: profile.avatar_url,
            social_links,
        }
    }
}

/// Compact follower count ("1.2M", "10.5k").
///
/// Commas are ignored and only the leading number counts, so "12,345 fans"
/// reads as 12345. Text with no leading number is returned unchanged.
pub fn format_followers(followers: &str) -> String {
    let cleaned = followers.replace(',', "");
    let num = match leading_number(&cleaned) {
        Some(n) => n,
        None => return followers.to_string(),
    };

    if num >= 1_000_000.0 {
        format!("{:.1}M", num / 1_000_000.0)
    } else if num >= 1_000.0 {
        format!("{:.1}k", num / 1_000.0)
    } else {
        format!("{}", num)
    }
}

fn leading_number(value: &str) -> Option<f64> {
    let trimmed = value.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (i, c) in trimmed.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }

    if !seen_digit {
        return None;
    }
    trimmed[..end].trim_end_matches('.').parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::models::SocialLink;

    #[test]
    fn test_format_followers_scales() {
        assert_eq!(format_followers("999"), "999");
        assert_eq!(format_followers("1000"), "1.0k");
        assert_eq!(format_followers("12,345"), "12.3k");
        assert_eq!(format_followers("2500000"), "2.5M");
    }

    #[test]
    fn test_format_followers_is_lenient() {
        assert_eq!(format_followers("10.5k"), "10.5");
        assert_eq!(format_followers("42 fans"), "42");
        assert_eq!(format_followers("lots"), "lots");
        assert_eq!(format_followers(""), "");
        assert_eq!(format_followers("7."), "7");
    }

    #[test]
    fn test_card_defaults() {
        let profile = Profile {
            id: "P_1".to_string(),
            email: "jane@example.com".to_string(),
            username: "jane".to_string(),
            full_name: None,
            avatar_url: None,
            tagline: None,
            social_links: vec![SocialLink {
                id: "1".to_string(),
                platform: Platform::Youtube,
                username: "janetube".to_string(),
                followers: "1500".to_string(),
            }],
            onboarding_complete: true,
            created_at: None,
            updated_at: None,
        };

        let card = PublicCard::from(profile);
        assert_eq!(card.name, "User");
        assert_eq!(card.tagline, "");
        assert_eq!(card.social_links[0].followers_display, "1.5k");
    }
}
