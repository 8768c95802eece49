// src/common/id_generator.rs
//! Crockford Base32 ID Generator
//!
//! Generates human-readable, prefixed IDs using Crockford Base32 encoding.
//! Format: PREFIX_XXXXXXXXXXXX (e.g., P_K7NP3XY2M9QA for profiles)
//!
//! The alphabet excludes I, L, O and U so ids survive being read aloud or
//! retyped from a screenshot.

use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Random characters in an entity id (32^12 ≈ 1.2e18 combinations)
pub const ENTITY_ID_LENGTH: usize = 12;

/// Random characters in a password reset token
pub const RESET_TOKEN_LENGTH: usize = 48;

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// Profile (P_)
    Profile,
    /// Credentials-provider account (C_)
    CredentialUser,
}

impl EntityPrefix {
    /// Get the string prefix for this entity type
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Profile => "P",
            EntityPrefix::CredentialUser => "C",
        }
    }
}

/// Generate a random Crockford Base32 string of specified length
fn generate_crockford_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..32);
            CROCKFORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Generate a prefixed ID using Crockford Base32 encoding
///
/// # Example
/// ```
/// let profile_id = generate_id(EntityPrefix::Profile);
/// // Returns something like "P_K7NP3XY2M9QA"
/// ```
pub fn generate_id(prefix: EntityPrefix) -> String {
    format!(
        "{}_{}",
        prefix.as_str(),
        generate_crockford_string(ENTITY_ID_LENGTH)
    )
}

/// Generate a raw Crockford Base32 string without prefix
pub fn generate_raw_id(length: usize) -> String {
    generate_crockford_string(length)
}

/// Generate a Profile ID (P_XXXXXXXXXXXX)
pub fn generate_profile_id() -> String {
    generate_id(EntityPrefix::Profile)
}

/// Generate a credentials account ID (C_XXXXXXXXXXXX)
pub fn generate_credential_user_id() -> String {
    generate_id(EntityPrefix::CredentialUser)
}

/// Generate an unguessable password reset token
pub fn generate_reset_token() -> String {
    generate_raw_id(RESET_TOKEN_LENGTH)
}
