//! In-memory adapter for the [`Store`] port.
//!
//! Backs integration tests and local experiments. One mutex guards the whole
//! state, so every operation (including insert-if-absent on email) is a
//! single atomic critical section.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use super::{
    ItemChanges, ItemRecord, NewItem, NewUser, Page, Store, StoreError, UserChanges, UserRecord,
};

#[derive(Default)]
struct State {
    users: BTreeMap<i64, UserRecord>,
    items: BTreeMap<i64, ItemRecord>,
    next_user_id: i64,
    next_item_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn window<T: Clone>(records: impl Iterator<Item = T>, page: Page) -> Vec<T> {
    records
        .skip(page.skip() as usize)
        .take(page.limit() as usize)
        .collect()
}

#[async_trait]
impl Store for MemoryStore {
    async fn user_by_id(&self, id: i64) -> Result<Option<UserRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|user| user.email == email).cloned())
    }

    async fn list_users(&self, page: Page) -> Result<Vec<UserRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(window(state.users.values().cloned(), page))
    }

    async fn insert_user(&self, new_user: NewUser) -> Result<UserRecord, StoreError> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|user| user.email == new_user.email) {
            return Err(StoreError::Conflict("email"));
        }

        state.next_user_id += 1;
        let now = Utc::now();
        let record = UserRecord {
            id: state.next_user_id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            full_name: new_user.full_name,
            is_active: new_user.is_active,
            is_superuser: new_user.is_superuser,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_user(
        &self,
        id: i64,
        changes: UserChanges,
    ) -> Result<Option<UserRecord>, StoreError> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&id) {
            return Ok(None);
        }
        if let Some(email) = &changes.email {
            if state
                .users
                .values()
                .any(|user| user.id != id && &user.email == email)
            {
                return Err(StoreError::Conflict("email"));
            }
        }

        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::Backend("user vanished mid-update".to_string()))?;
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(full_name) = changes.full_name {
            user.full_name = Some(full_name);
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: i64) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        state.items.retain(|_, item| item.owner_id != id);
        Ok(true)
    }

    async fn item_by_id(&self, id: i64) -> Result<Option<ItemRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.items.get(&id).cloned())
    }

    async fn list_items(&self, page: Page) -> Result<Vec<ItemRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(window(state.items.values().cloned(), page))
    }

    async fn items_by_owner(
        &self,
        owner_id: i64,
        page: Page,
    ) -> Result<Vec<ItemRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(window(
            state
                .items
                .values()
                .filter(|item| item.owner_id == owner_id)
                .cloned(),
            page,
        ))
    }

    async fn insert_item(&self, new_item: NewItem) -> Result<ItemRecord, StoreError> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&new_item.owner_id) {
            return Err(StoreError::MissingOwner(new_item.owner_id));
        }

        state.next_item_id += 1;
        let now = Utc::now();
        let record = ItemRecord {
            id: state.next_item_id,
            title: new_item.title,
            description: new_item.description,
            owner_id: new_item.owner_id,
            created_at: now,
            updated_at: now,
        };
        state.items.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_item(
        &self,
        id: i64,
        changes: ItemChanges,
    ) -> Result<Option<ItemRecord>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(item) = state.items.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            item.title = title;
        }
        if let Some(description) = changes.description {
            item.description = Some(description);
        }
        item.updated_at = Utc::now();
        Ok(Some(item.clone()))
    }

    async fn delete_item(&self, id: i64) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        Ok(state.items.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            full_name: None,
            is_active: true,
            is_superuser: false,
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@example.com")).await?;

        let result = store.insert_user(new_user("a@example.com")).await;
        assert!(matches!(result, Err(StoreError::Conflict("email"))));
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_duplicate_registrations_resolve_to_one_winner() -> anyhow::Result<()> {
        let store = MemoryStore::new();

        let task_one = store.insert_user(new_user("race@example.com"));
        let task_two = store.insert_user(new_user("race@example.com"));
        let (result_one, result_two) = tokio::join!(task_one, task_two);

        let outcomes = [result_one, result_two];
        let successes = outcomes.iter().filter(|result| result.is_ok()).count();
        let conflicts = outcomes
            .iter()
            .filter(|result| matches!(result, Err(StoreError::Conflict(_))))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(conflicts, 1);
        Ok(())
    }

    #[tokio::test]
    async fn update_to_taken_email_conflicts() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@example.com")).await?;
        let second = store.insert_user(new_user("b@example.com")).await?;

        let changes = UserChanges {
            email: Some("a@example.com".to_string()),
            ..UserChanges::default()
        };
        let result = store.update_user(second.id, changes).await;
        assert!(matches!(result, Err(StoreError::Conflict("email"))));
        Ok(())
    }

    #[tokio::test]
    async fn deleting_user_removes_owned_items() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let owner = store.insert_user(new_user("owner@example.com")).await?;
        let other = store.insert_user(new_user("other@example.com")).await?;

        let item = store
            .insert_item(NewItem {
                title: "kept by owner".to_string(),
                description: None,
                owner_id: owner.id,
            })
            .await?;
        let unrelated = store
            .insert_item(NewItem {
                title: "someone else's".to_string(),
                description: None,
                owner_id: other.id,
            })
            .await?;

        assert!(store.delete_user(owner.id).await?);
        assert!(store.item_by_id(item.id).await?.is_none());
        assert!(store.item_by_id(unrelated.id).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn item_requires_existing_owner() {
        let store = MemoryStore::new();
        let result = store
            .insert_item(NewItem {
                title: "orphan".to_string(),
                description: None,
                owner_id: 42,
            })
            .await;
        assert!(matches!(result, Err(StoreError::MissingOwner(42))));
    }

    #[tokio::test]
    async fn pagination_windows_results() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        for index in 0..5 {
            store
                .insert_user(new_user(&format!("user{index}@example.com")))
                .await?;
        }

        let page = store.list_users(Page::new(1, 2)).await?;
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].email, "user1@example.com");
        Ok(())
    }
}
