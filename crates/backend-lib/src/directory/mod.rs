// ============================
// backend-lib/src/directory/mod.rs
// ============================
//! User directory abstraction with in-memory and flat-file implementations.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod flat_file;
mod memory;

pub use flat_file::FlatFileDirectory;
pub use memory::InMemoryDirectory;

/// A registered account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Sortable opaque id (UUIDv7 text)
    pub id: String,
    /// Unique email address
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a new account with a freshly generated id.
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            email: email.into(),
            password_hash: password_hash.into(),
            created_at: Utc::now(),
        }
    }
}

/// Errors reported by a [`UserDirectory`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("user not found")]
    NotFound,

    #[error("email already exists")]
    Conflict,

    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<std::io::Error> for DirectoryError {
    fn from(err: std::io::Error) -> Self {
        DirectoryError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for DirectoryError {
    fn from(err: serde_json::Error) -> Self {
        DirectoryError::Storage(err.to_string())
    }
}

/// Storage of user accounts
///
/// Implementations own their consistency: `create` must reject a duplicate
/// email atomically, even under concurrent calls.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Persist a new user
    async fn create(&self, user: User) -> Result<(), DirectoryError>;

    /// Look a user up by email
    async fn get_by_email(&self, email: &str) -> Result<User, DirectoryError>;

    /// Look a user up by id
    async fn get_by_id(&self, id: &str) -> Result<User, DirectoryError>;
}
