//! Repository for the append-only message history.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::{
    error::Result,
    models::{Message, UserId},
    time::Clock,
};

/// Repository for message database operations.
pub struct Repository {
    pool: Arc<SqlitePool>,
    clock: Arc<dyn Clock>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<SqlitePool>, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Appends a message for an existing user.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ConstraintViolation` if the user does not exist,
    /// or a database error if the insert fails.
    pub async fn insert_message(&self, user_id: &UserId, text: &str) -> Result<Message> {
        let message = sqlx::query_as::<_, Message>(
            r"
            INSERT INTO messages (user_id, message, created_at)
            VALUES (?1, ?2, ?3)
            RETURNING id, user_id, message, created_at
            ",
        )
        .bind(user_id)
        .bind(text)
        .bind(self.clock.now_utc())
        .fetch_one(&*self.pool)
        .await?;

        Ok(message)
    }

    /// Lists the messages of one user in insertion order.
    ///
    /// # Errors
    ///
    /// Returns error if query fails.
    pub async fn list_messages(&self, user_id: &UserId) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r"
            SELECT id, user_id, message, created_at
            FROM messages
            WHERE user_id = ?1
            ORDER BY id
            ",
        )
        .bind(user_id)
        .fetch_all(&*self.pool)
        .await?;

        Ok(messages)
    }

    /// Counts all messages.
    ///
    /// # Errors
    ///
    /// Returns error if query fails.
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages").fetch_one(&*self.pool).await?;

        Ok(count)
    }

    /// Counts the messages of one user.
    ///
    /// # Errors
    ///
    /// Returns error if query fails.
    pub async fn count_for_user(&self, user_id: &UserId) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&*self.pool)
            .await?;

        Ok(count)
    }
}
