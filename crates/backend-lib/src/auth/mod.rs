// ============================
// backend-lib/src/auth/mod.rs
// ============================
//! Authentication core: password hashing, bearer tokens and the service
//! that ties them to a user directory.

pub mod password;
pub mod service;
pub mod token;

pub use password::{HashParams, PasswordHasher};
pub use service::{AuthService, DefaultAuth, RegistrationPolicy};
pub use token::{Claims, TokenIssuer, DEFAULT_TOKEN_TTL, MAX_TOKEN_TTL};

use thiserror::Error;

use crate::directory::DirectoryError;

/// Errors returned by the authentication core
///
/// Every token failure surfaces as [`AuthError::InvalidToken`], whichever
/// check rejected it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("stored password hash is malformed")]
    MalformedHash,

    #[error("invalid token")]
    InvalidToken,

    #[error("email already registered")]
    Conflict,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("password does not meet requirements: {0}")]
    WeakPassword(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<DirectoryError> for AuthError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Conflict => AuthError::Conflict,
            // Callers that expect absence handle `NotFound` before converting.
            DirectoryError::NotFound => AuthError::Storage("user not found".to_string()),
            DirectoryError::Storage(msg) => AuthError::Storage(msg),
        }
    }
}
