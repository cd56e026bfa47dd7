// crates/queue/src/connection.rs
//! Queue database connection management

use crate::error::{QueueError, QueueResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

/// Queue database connection pool
pub type QueuePool = Pool<Sqlite>;

/// Queue database configuration
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Path to the SQLite database file
    pub path: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Enable Write-Ahead Logging (WAL) mode
    pub enable_wal: bool,
    /// Create database if it doesn't exist
    pub create_if_missing: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            path: "flightsync-queue.db".to_string(),
            max_connections: 5,
            enable_wal: true,
            create_if_missing: true,
        }
    }
}

impl QueueConfig {
    /// Creates a new configuration with a custom path
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Sets the maximum number of connections
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Enables or disables WAL mode
    pub fn with_wal(mut self, enable: bool) -> Self {
        self.enable_wal = enable;
        self
    }
}

/// Creates a connection pool from a configuration
pub async fn create_pool(config: &QueueConfig) -> QueueResult<QueuePool> {
    let mut options = SqliteConnectOptions::from_str(&format!("sqlite://{}", config.path))
        .map_err(|e| QueueError::database("Invalid queue database path", e))?
        .create_if_missing(config.create_if_missing)
        .synchronous(SqliteSynchronous::Normal);

    if config.enable_wal {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .map_err(|e| QueueError::database("Failed to open queue database", e))
}

/// Creates an in-memory pool for tests
pub async fn create_test_db() -> QueueResult<QueuePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| QueueError::database("Failed to create test database", e))?
        .journal_mode(SqliteJournalMode::Memory);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| QueueError::database("Failed to connect to test database", e))
}

/// Closes a pool, flushing outstanding writes
pub async fn close(pool: QueuePool) {
    pool.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = QueueConfig::new("/tmp/q.db")
            .with_max_connections(2)
            .with_wal(false);
        assert_eq!(config.path, "/tmp/q.db");
        assert_eq!(config.max_connections, 2);
        assert!(!config.enable_wal);
    }

    #[tokio::test]
    async fn test_create_test_db() {
        let pool = create_test_db().await.unwrap();
        let result: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&pool).await.unwrap();
        assert_eq!(result.0, 1);
        close(pool).await;
    }

    #[tokio::test]
    async fn test_create_pool_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.db");
        let config = QueueConfig::new(path.to_string_lossy().to_string());
        let pool = create_pool(&config).await.unwrap();
        close(pool).await;
        assert!(path.exists());
    }
}
