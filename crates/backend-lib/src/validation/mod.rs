// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Input validation for registration and login.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

use crate::auth::AuthError;

const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),
}

impl From<ValidationError> for AuthError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidEmail(msg) => AuthError::InvalidInput(msg),
            ValidationError::InvalidPassword(msg) => AuthError::WeakPassword(msg),
        }
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Password complexity requirements, enforced when an account is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordRequirements {
    /// Minimum password length in characters
    pub min_length: usize,
    /// Require uppercase letters
    pub require_uppercase: bool,
    /// Require lowercase letters
    pub require_lowercase: bool,
    /// Require digits
    pub require_digit: bool,
    /// Require a non-alphanumeric character
    pub require_special: bool,
}

impl Default for PasswordRequirements {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: false,
        }
    }
}

/// Normalize and validate an email address.
///
/// Returns the trimmed, lowercased address that is used as the directory key.
pub fn normalize_email(email: &str) -> ValidationResult<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email address cannot be empty".to_string(),
        ));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email address cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(
            "Invalid email address format".to_string(),
        ));
    }

    Ok(email.to_ascii_lowercase())
}

/// Check a new password against `requirements`.
pub fn validate_password(password: &str, requirements: &PasswordRequirements) -> ValidationResult<()> {
    let length = password.chars().count();
    if length < requirements.min_length {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must be at least {} characters",
            requirements.min_length
        )));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password cannot exceed {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    let mut missing = Vec::new();
    if requirements.require_uppercase && !password.chars().any(char::is_uppercase) {
        missing.push("an uppercase letter");
    }
    if requirements.require_lowercase && !password.chars().any(char::is_lowercase) {
        missing.push("a lowercase letter");
    }
    if requirements.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        missing.push("a digit");
    }
    if requirements.require_special && !password.chars().any(|c| !c.is_alphanumeric()) {
        missing.push("a special character");
    }

    if !missing.is_empty() {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must contain {}",
            missing.join(", ")
        )));
    }

    Ok(())
}
