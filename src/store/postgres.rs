//! PostgreSQL adapter for the [`Store`] port.
//!
//! Raw queries with per-query tracing spans. Duplicate emails are detected
//! from the unique index violation on insert/update, never by a prior
//! existence check.

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::Instrument;

use super::{
    ItemChanges, ItemRecord, NewItem, NewUser, Page, Store, StoreError, UserChanges, UserRecord,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn query_span(operation: &str, statement: &str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23503"),
        _ => false,
    }
}

fn user_from_row(row: &PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        full_name: row.get("full_name"),
        is_active: row.get("is_active"),
        is_superuser: row.get("is_superuser"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn item_from_row(row: &PgRow) -> ItemRecord {
    ItemRecord {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const USER_COLUMNS: &str =
    "id, email, password_hash, full_name, is_active, is_superuser, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, title, description, owner_id, created_at, updated_at";

#[async_trait]
impl Store for PgStore {
    async fn user_by_id(&self, id: i64) -> Result<Option<UserRecord>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to lookup user by id")?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to lookup user by email")?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn list_users(&self, page: Page) -> Result<Vec<UserRecord>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT $1 OFFSET $2");
        let rows = sqlx::query(&query)
            .bind(page.limit())
            .bind(page.skip())
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to list users")?;
        Ok(rows.iter().map(user_from_row).collect())
    }

    async fn insert_user(&self, new_user: NewUser) -> Result<UserRecord, StoreError> {
        let query = format!(
            r"
            INSERT INTO users (email, password_hash, full_name, is_active, is_superuser)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "
        );
        let row = sqlx::query(&query)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.full_name)
            .bind(new_user.is_active)
            .bind(new_user.is_superuser)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", &query))
            .await;

        match row {
            Ok(row) => Ok(user_from_row(&row)),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict("email")),
            Err(err) => Err(anyhow!(err).context("failed to insert user").into()),
        }
    }

    async fn update_user(
        &self,
        id: i64,
        changes: UserChanges,
    ) -> Result<Option<UserRecord>, StoreError> {
        let query = format!(
            r"
            UPDATE users
            SET
                email = COALESCE($1, email),
                full_name = COALESCE($2, full_name),
                password_hash = COALESCE($3, password_hash),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE id = $5
            RETURNING {USER_COLUMNS}
            "
        );
        let row = sqlx::query(&query)
            .bind(&changes.email)
            .bind(&changes.full_name)
            .bind(&changes.password_hash)
            .bind(changes.is_active)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("UPDATE", &query))
            .await;

        match row {
            Ok(row) => Ok(row.as_ref().map(user_from_row)),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict("email")),
            Err(err) => Err(anyhow!(err).context("failed to update user").into()),
        }
    }

    async fn delete_user(&self, id: i64) -> Result<bool, StoreError> {
        // Owned items go with the user via ON DELETE CASCADE.
        let query = "DELETE FROM users WHERE id = $1";
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await
            .context("failed to delete user")?;
        Ok(result.rows_affected() > 0)
    }

    async fn item_by_id(&self, id: i64) -> Result<Option<ItemRecord>, StoreError> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to lookup item")?;
        Ok(row.as_ref().map(item_from_row))
    }

    async fn list_items(&self, page: Page) -> Result<Vec<ItemRecord>, StoreError> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id LIMIT $1 OFFSET $2");
        let rows = sqlx::query(&query)
            .bind(page.limit())
            .bind(page.skip())
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to list items")?;
        Ok(rows.iter().map(item_from_row).collect())
    }

    async fn items_by_owner(
        &self,
        owner_id: i64,
        page: Page,
    ) -> Result<Vec<ItemRecord>, StoreError> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE owner_id = $1 ORDER BY id LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&query)
            .bind(owner_id)
            .bind(page.limit())
            .bind(page.skip())
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to list items by owner")?;
        Ok(rows.iter().map(item_from_row).collect())
    }

    async fn insert_item(&self, new_item: NewItem) -> Result<ItemRecord, StoreError> {
        let query = format!(
            r"
            INSERT INTO items (title, description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING {ITEM_COLUMNS}
            "
        );
        let row = sqlx::query(&query)
            .bind(&new_item.title)
            .bind(&new_item.description)
            .bind(new_item.owner_id)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", &query))
            .await;

        match row {
            Ok(row) => Ok(item_from_row(&row)),
            Err(err) if is_foreign_key_violation(&err) => {
                Err(StoreError::MissingOwner(new_item.owner_id))
            }
            Err(err) => Err(anyhow!(err).context("failed to insert item").into()),
        }
    }

    async fn update_item(
        &self,
        id: i64,
        changes: ItemChanges,
    ) -> Result<Option<ItemRecord>, StoreError> {
        let query = format!(
            r"
            UPDATE items
            SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                updated_at = NOW()
            WHERE id = $3
            RETURNING {ITEM_COLUMNS}
            "
        );
        let row = sqlx::query(&query)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("UPDATE", &query))
            .await
            .context("failed to update item")?;
        Ok(row.as_ref().map(item_from_row))
    }

    async fn delete_item(&self, id: i64) -> Result<bool, StoreError> {
        let query = "DELETE FROM items WHERE id = $1";
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await
            .context("failed to delete item")?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    #[test]
    fn unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));
        assert!(!is_foreign_key_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }

    #[test]
    fn foreign_key_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23503"),
        }));
        assert!(is_foreign_key_violation(&err));
        assert!(!is_unique_violation(&err));
    }
}
