// src/profile/validators.rs

use serde_json::{Map, Value};

use super::models::*;
use crate::common::validation::char_len;
use crate::common::{ApiError, ValidationResult, Validator};

const SOCIAL_LINK_FIELDS: [(&str, &str); 4] = [
    ("id", "Link id"),
    ("platform", "Platform"),
    ("username", "Username"),
    ("followers", "Followers"),
];

// ============================================================================
// Request Shape
// ============================================================================

/// Turns a raw update body into a typed request.
///
/// Missing and wrong-typed fields are all reported together as one
/// validation error before any content rule runs.
pub fn parse_update_request(body: Value) -> Result<UpdateProfileRequest, ApiError> {
    let mut result = ValidationResult::new();

    match body.as_object() {
        Some(object) => result.merge(check_update_shape(object)),
        None => result.add_error("body", "Request body must be a JSON object"),
    }
    result.into_result()?;

    serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
}

fn check_update_shape(object: &Map<String, Value>) -> ValidationResult {
    let mut result = ValidationResult::new();

    match object.get("tagline") {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => result.add_error("tagline", "Tagline must be a string"),
    }

    match object.get("socialLinks") {
        None | Some(Value::Null) => {}
        Some(Value::Array(links)) => {
            for (index, link) in links.iter().enumerate() {
                result.merge(check_social_link_shape(index, link));
            }
        }
        Some(_) => result.add_error("socialLinks", "Social links must be an array"),
    }

    result
}

fn check_social_link_shape(index: usize, link: &Value) -> ValidationResult {
    let mut result = ValidationResult::new();

    let object = match link.as_object() {
        Some(object) => object,
        None => {
            result.add_error(
                &format!("socialLinks[{}]", index),
                "Social link must be an object",
            );
            return result;
        }
    };

    for (name, label) in SOCIAL_LINK_FIELDS {
        let field = format!("socialLinks[{}].{}", index, name);
        match object.get(name) {
            Some(Value::String(_)) => {}
            None | Some(Value::Null) => result.add_error(&field, &format!("{} is required", label)),
            Some(_) => result.add_error(&field, &format!("{} must be a string", label)),
        }
    }

    result
}

// ============================================================================
// Profile Update Validator
// ============================================================================

pub struct ProfileUpdateValidator;

impl Validator<UpdateProfileRequest> for ProfileUpdateValidator {
    fn validate(&self, data: &UpdateProfileRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let Some(tagline) = &data.tagline {
            if char_len(tagline) > MAX_TAGLINE_CHARS {
                result.add_error(
                    "tagline",
                    &format!("Tagline must be at most {} characters", MAX_TAGLINE_CHARS),
                );
            }
        }

        if let Some(links) = &data.social_links {
            if links.len() > MAX_SOCIAL_LINKS {
                result.add_error(
                    "socialLinks",
                    &format!("At most {} social links are allowed", MAX_SOCIAL_LINKS),
                );
            }

            for (index, link) in links.iter().enumerate() {
                result.merge(validate_social_link(index, link));
            }
        }

        result
    }
}

fn validate_social_link(index: usize, link: &SocialLinkInput) -> ValidationResult {
    let mut result = ValidationResult::new();
    let field = |name: &str| format!("socialLinks[{}].{}", index, name);

    if link.id.trim().is_empty() {
        result.add_error(&field("id"), "Link id is required");
    }

    if link.platform.parse::<Platform>().is_err() {
        result.add_error(
            &field("platform"),
            "Platform must be one of instagram, tiktok, youtube, x",
        );
    }

    if char_len(&link.username) > MAX_SOCIAL_USERNAME_CHARS {
        result.add_error(
            &field("username"),
            &format!(
                "Username must be at most {} characters",
                MAX_SOCIAL_USERNAME_CHARS
            ),
        );
    }

    if char_len(&link.followers) > MAX_FOLLOWERS_CHARS {
        result.add_error(
            &field("followers"),
            &format!(
                "Followers must be at most {} characters",
                MAX_FOLLOWERS_CHARS
            ),
        );
    }

    result
}

/// Converts an already validated request into the store's update shape
pub fn to_profile_update(request: UpdateProfileRequest) -> ProfileUpdate {
    ProfileUpdate {
        tagline: request.tagline,
        social_links: request.social_links.map(|links| {
            links
                .into_iter()
                .filter_map(|link| {
                    let platform = link.platform.parse::<Platform>().ok()?;
                    Some(SocialLink {
                        id: link.id,
                        platform,
                        username: link.username,
                        followers: link.followers,
                    })
                })
                .collect()
        }),
    }
}
