// src/auth/validators.rs

use super::models::{RegisterRequest, ResetPasswordRequest};
use crate::common::validation::{char_len, is_valid_email};
use crate::common::{ValidationResult, Validator};

pub const MIN_PASSWORD_CHARS: usize = 6;
pub const MAX_NAME_CHARS: usize = 100;

fn check_password(result: &mut ValidationResult, field: &str, password: &str) {
    if char_len(password) < MIN_PASSWORD_CHARS {
        result.add_error(
            field,
            &format!("Password must be at least {} characters", MIN_PASSWORD_CHARS),
        );
    }
}

pub struct RegisterValidator;

impl Validator<RegisterRequest> for RegisterValidator {
    fn validate(&self, data: &RegisterRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if !is_valid_email(data.email.trim()) {
            result.add_error("email", "Invalid email address.");
        }

        check_password(&mut result, "password", &data.password);

        if let Some(name) = &data.name {
            if char_len(name.trim()) > MAX_NAME_CHARS {
                result.add_error(
                    "name",
                    &format!("Name must be at most {} characters", MAX_NAME_CHARS),
                );
            }
        }

        result
    }
}

pub struct ResetPasswordValidator;

impl Validator<ResetPasswordRequest> for ResetPasswordValidator {
    fn validate(&self, data: &ResetPasswordRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.token.trim().is_empty() {
            result.add_error("token", "Reset token is required");
        }

        check_password(&mut result, "password", &data.password);

        if data.password != data.confirm_password {
            result.add_error("confirmPassword", "Passwords do not match");
        }

        result
    }
}
