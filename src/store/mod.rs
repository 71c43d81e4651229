//! Persistence port for user and item records.
//!
//! The service talks to one [`Store`] trait; adapters map their failures into
//! the typed [`StoreError`] variants instead of leaking backend errors.
//! Uniqueness of user emails is enforced here: inserting or updating to a
//! taken email fails atomically with [`StoreError::Conflict`], so callers
//! never need a racy check-then-insert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

pub mod postgres;

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

/// Persisted user. `password_hash` stays inside the service boundary and is
/// never serialized into responses.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persisted item. `owner_id` references an existing user.
#[derive(Debug, Clone)]
pub struct ItemRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
}

/// Partial user update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewItem {
    pub title: String,
    pub description: Option<String>,
    pub owner_id: i64,
}

/// Partial item update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ItemChanges {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Skip/limit window for list queries.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    skip: i64,
    limit: i64,
}

impl Page {
    #[must_use]
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip: skip.max(0),
            limit: limit.max(0),
        }
    }

    #[must_use]
    pub fn skip(&self) -> i64 {
        self.skip
    }

    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, 100)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (duplicate email).
    #[error("unique constraint violated: {0}")]
    Conflict(&'static str),
    /// An item write referenced a user that does not exist.
    #[error("owner {0} does not exist")]
    MissingOwner(i64),
    /// Connectivity or other backend failure.
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        // Keep the full context chain; the boundary logs it and returns a
        // generic response.
        Self::Backend(format!("{err:#}"))
    }
}

pub type DynStore = Arc<dyn Store>;

/// CRUD access to users and items.
///
/// Each method is one atomic operation from the caller's perspective; no
/// multi-step protocol spans calls.
#[async_trait]
pub trait Store: Send + Sync {
    async fn user_by_id(&self, id: i64) -> Result<Option<UserRecord>, StoreError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;
    async fn list_users(&self, page: Page) -> Result<Vec<UserRecord>, StoreError>;
    /// Insert-if-absent on the unique email index.
    async fn insert_user(&self, new_user: NewUser) -> Result<UserRecord, StoreError>;
    /// Apply partial changes; `Ok(None)` when the user does not exist.
    async fn update_user(
        &self,
        id: i64,
        changes: UserChanges,
    ) -> Result<Option<UserRecord>, StoreError>;
    /// Delete a user and all items they own. `Ok(false)` when absent.
    async fn delete_user(&self, id: i64) -> Result<bool, StoreError>;

    async fn item_by_id(&self, id: i64) -> Result<Option<ItemRecord>, StoreError>;
    async fn list_items(&self, page: Page) -> Result<Vec<ItemRecord>, StoreError>;
    async fn items_by_owner(
        &self,
        owner_id: i64,
        page: Page,
    ) -> Result<Vec<ItemRecord>, StoreError>;
    async fn insert_item(&self, new_item: NewItem) -> Result<ItemRecord, StoreError>;
    async fn update_item(
        &self,
        id: i64,
        changes: ItemChanges,
    ) -> Result<Option<ItemRecord>, StoreError>;
    async fn delete_item(&self, id: i64) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_clamps_negative_values() {
        let page = Page::new(-5, -1);
        assert_eq!(page.skip(), 0);
        assert_eq!(page.limit(), 0);
    }

    #[test]
    fn page_default_window() {
        let page = Page::default();
        assert_eq!(page.skip(), 0);
        assert_eq!(page.limit(), 100);
    }

    #[test]
    fn store_error_messages() {
        assert_eq!(
            StoreError::Conflict("email").to_string(),
            "unique constraint violated: email"
        );
        assert_eq!(
            StoreError::MissingOwner(7).to_string(),
            "owner 7 does not exist"
        );
    }
}
