//! Repository for user records.
//!
//! Users are created on their first message and afterwards only have their
//! display name refreshed. They are never deleted.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::{
    error::Result,
    models::{User, UserId},
    time::Clock,
};

/// Repository for user database operations.
pub struct Repository {
    pool: Arc<SqlitePool>,
    clock: Arc<dyn Clock>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<SqlitePool>, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Inserts the user if absent, otherwise refreshes its display name.
    ///
    /// A `None` name keeps the stored name; a new user without a name is
    /// stored under [`User::fallback_name`]. `created_at` is only set on
    /// insert.
    ///
    /// # Errors
    ///
    /// Returns error if the statement fails.
    pub async fn upsert_user(&self, user_id: &UserId, display_name: Option<&str>) -> Result<User> {
        let initial_name =
            display_name.map_or_else(|| User::fallback_name(user_id), ToString::to_string);

        let user = sqlx::query_as::<_, User>(
            r"
            INSERT INTO users (user_id, display_name, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (user_id) DO UPDATE
                SET display_name = COALESCE(?4, users.display_name)
            RETURNING user_id, display_name, created_at
            ",
        )
        .bind(user_id)
        .bind(initial_name)
        .bind(self.clock.now_utc())
        .bind(display_name)
        .fetch_one(&*self.pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by identifier.
    ///
    /// # Errors
    ///
    /// Returns error if query fails.
    pub async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, display_name, created_at FROM users WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(user)
    }

    /// Lists all users in insertion order.
    ///
    /// # Errors
    ///
    /// Returns error if query fails.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT user_id, display_name, created_at FROM users ORDER BY rowid",
        )
        .fetch_all(&*self.pool)
        .await?;

        Ok(users)
    }

    /// Counts all users.
    ///
    /// # Errors
    ///
    /// Returns error if query fails.
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users").fetch_one(&*self.pool).await?;

        Ok(count)
    }
}
