// ================
// common/src/lib.rs
// ================
//! Request and response bodies shared between the `passgate` server and
//! its clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Token scheme reported to clients
pub const TOKEN_TYPE: &str = "Bearer";

/// Email and password submitted to `/api/login` and `/api/register`
///
/// The password is wiped from memory when the value is dropped.
#[derive(Deserialize, Serialize, Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    /// Account email
    pub email: String,
    /// Plaintext password
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login or registration
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    /// Signed bearer token
    pub token: String,
    /// Always [`TOKEN_TYPE`]
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: u64,
}

impl TokenResponse {
    pub fn bearer(token: String, expires_in: u64) -> Self {
        Self {
            token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in,
        }
    }
}

/// Public view of a user account
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Error body returned by every failing endpoint
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Machine-readable code plus a human message
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}
