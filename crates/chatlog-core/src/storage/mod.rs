//! Database access layer implementing the repository pattern for chat
//! history persistence.
//!
//! All SQL lives in these repositories. Handlers and tests go through
//! [`Storage`] rather than issuing queries of their own.

use std::{str::FromStr, sync::Arc, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::{debug, info};

pub mod messages;
pub mod users;

use crate::{error::Result, time::Clock};

/// Connection pool settings for [`Storage::connect`].
#[derive(Debug, Clone)]
pub struct StorageOptions {
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// How long to wait for a free connection.
    pub acquire_timeout: Duration,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self { max_connections: 5, acquire_timeout: Duration::from_secs(10) }
    }
}

/// Container for all repository instances providing unified database access.
///
/// Cloning is cheap; every clone shares the same pool.
#[derive(Clone)]
pub struct Storage {
    /// Repository for user records.
    pub users: Arc<users::Repository>,

    /// Repository for message history.
    pub messages: Arc<messages::Repository>,

    pool: Arc<SqlitePool>,
}

impl Storage {
    /// Creates a new storage instance over an existing pool.
    ///
    /// Record timestamps are taken from `clock`.
    pub fn new(pool: SqlitePool, clock: &Arc<dyn Clock>) -> Self {
        let pool = Arc::new(pool);

        Self {
            users: Arc::new(users::Repository::new(pool.clone(), clock.clone())),
            messages: Arc::new(messages::Repository::new(pool.clone(), clock.clone())),
            pool,
        }
    }

    /// Opens a pool for `database_url` and creates the schema.
    ///
    /// In-memory databases live as long as their connection, so they are
    /// pinned to a single connection that is never recycled.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if the URL is invalid, the database
    /// cannot be opened, or schema creation fails.
    pub async fn connect(
        database_url: &str,
        options: &StorageOptions,
        clock: &Arc<dyn Clock>,
    ) -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool_options = if is_in_memory(database_url) {
            debug!("Using single-connection pool for in-memory database");
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(Option::<Duration>::None)
                .max_lifetime(Option::<Duration>::None)
        } else {
            SqlitePoolOptions::new().max_connections(options.max_connections)
        };

        let pool = pool_options
            .acquire_timeout(options.acquire_timeout)
            .connect_with(connect_options)
            .await?;

        let storage = Self::new(pool, clock);
        storage.initialize().await?;

        info!(max_connections = options.max_connections, "Storage ready");
        Ok(storage)
    }

    /// Creates tables and indexes if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if any DDL statement fails.
    pub async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                user_id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&*self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL REFERENCES users (user_id),
                message TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&*self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_user_id ON messages (user_id, id)")
            .execute(&*self.pool)
            .await?;

        debug!("Schema initialized");
        Ok(())
    }

    /// Performs a health check on the database connection.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if the connection is unhealthy.
    pub async fn health_check(&self) -> Result<()> {
        let _: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&*self.pool).await?;

        Ok(())
    }

    /// Closes all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}
