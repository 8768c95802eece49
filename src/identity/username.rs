// src/identity/username.rs
//! Username derivation for newly created profiles

/// Used when an email local part has no usable characters
const FALLBACK_USERNAME: &str = "user";

/// Lower-cased email local part, restricted to URL-safe slug characters
pub fn base_username(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let slug: String = local
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    if slug.is_empty() {
        FALLBACK_USERNAME.to_string()
    } else {
        slug
    }
}

/// `base` when nothing shares the prefix, otherwise `base` followed by a number
pub fn with_suffix(base: &str, suffix: i64) -> String {
    if suffix <= 0 {
        base.to_string()
    } else {
        format!("{}{}", base, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_username_uses_lowercased_local_part() {
        assert_eq!(base_username("NewUser@example.com"), "newuser");
        assert_eq!(base_username("jane.doe_01@x.com"), "jane.doe_01");
    }

    #[test]
    fn test_base_username_strips_unsafe_characters() {
        assert_eq!(base_username("o'brien+promo@x.com"), "obrienpromo");
        assert_eq!(base_username("+++@x.com"), "user");
        assert_eq!(base_username("josé@x.com"), "jos");
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(with_suffix("jane", 0), "jane");
        assert_eq!(with_suffix("jane", 2), "jane2");
    }
}
