// crates/queue/src/migrations.rs
//! Queue database migrations

use crate::connection::QueuePool;
use crate::error::{QueueError, QueueResult};

/// Migration 001: Pending operations log
const MIGRATION_001: &str = include_str!("../migrations/001_pending_operations.sql");

/// Migration 002: Sync metadata (last successful sync, etc.)
const MIGRATION_002: &str = include_str!("../migrations/002_sync_meta.sql");

/// Migration 003: Replay index
const MIGRATION_003: &str = include_str!("../migrations/003_operation_indexes.sql");

/// Current queue schema version
pub const CURRENT_VERSION: i64 = 3;

/// Returns the current migration version
pub fn current_version() -> i64 {
    CURRENT_VERSION
}

/// Runs all pending migrations
pub async fn run_migrations(pool: &QueuePool) -> QueueResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| QueueError::database("Failed to create migrations table", e))?;

    run_migration(pool, 1, MIGRATION_001).await?;
    run_migration(pool, 2, MIGRATION_002).await?;
    run_migration(pool, 3, MIGRATION_003).await?;

    Ok(())
}

/// Runs a single migration if not already applied
async fn run_migration(pool: &QueuePool, version: i64, sql: &str) -> QueueResult<()> {
    let applied: Option<i64> =
        sqlx::query_scalar("SELECT version FROM schema_migrations WHERE version = ?")
            .bind(version)
            .fetch_optional(pool)
            .await
            .map_err(|e| QueueError::database("Failed to check migration version", e))?;

    if applied.is_some() {
        return Ok(());
    }

    sqlx::query(sql)
        .execute(pool)
        .await
        .map_err(|e| QueueError::database(format!("Failed to apply migration {version}"), e))?;

    sqlx::query("INSERT INTO schema_migrations (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await
        .map_err(|e| QueueError::database(format!("Failed to record migration {version}"), e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::create_test_db;

    #[tokio::test]
    async fn test_migrations_apply() {
        let pool = create_test_db().await.unwrap();
        run_migrations(&pool).await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM schema_migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, CURRENT_VERSION);
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let pool = create_test_db().await.unwrap();
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM schema_migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, CURRENT_VERSION);
    }
}
