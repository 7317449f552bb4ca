use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};

use super::{DirectoryError, User, UserDirectory};

/// Directory kept entirely in memory
///
/// Users live in `by_id`; `by_email` maps each email to its id and is the
/// source of truth for uniqueness.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    by_id: DashMap<String, User>,
    by_email: DashMap<String, String>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub(super) fn insert(&self, user: User) -> Result<(), DirectoryError> {
        match self.by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(DirectoryError::Conflict),
            Entry::Vacant(slot) => {
                // The email shard stays locked until the user is visible by id.
                self.by_id.insert(user.id.clone(), user.clone());
                slot.insert(user.id);
                Ok(())
            }
        }
    }

    pub(super) fn contains_email(&self, email: &str) -> bool {
        self.by_email.contains_key(email)
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn create(&self, user: User) -> Result<(), DirectoryError> {
        self.insert(user)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, DirectoryError> {
        let id = self
            .by_email
            .get(email)
            .map(|id| id.value().clone())
            .ok_or(DirectoryError::NotFound)?;
        self.get_by_id(&id).await
    }

    async fn get_by_id(&self, id: &str) -> Result<User, DirectoryError> {
        self.by_id
            .get(id)
            .map(|user| user.value().clone())
            .ok_or(DirectoryError::NotFound)
    }
}
