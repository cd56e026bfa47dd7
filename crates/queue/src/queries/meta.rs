// crates/queue/src/queries/meta.rs
//! Sync metadata persistence

use crate::connection::QueuePool;
use crate::error::{QueueError, QueueResult};
use chrono::{DateTime, Utc};

const LAST_SYNC_KEY: &str = "last_successful_sync";

/// Records the timestamp of the last successful sync pass
pub async fn set_last_sync(pool: &QueuePool, at: DateTime<Utc>) -> QueueResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sync_meta (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(LAST_SYNC_KEY)
    .bind(at.timestamp_millis().to_string())
    .execute(pool)
    .await
    .map_err(|e| QueueError::database("Failed to set last sync timestamp", e))?;

    Ok(())
}

/// The timestamp of the last successful sync pass, if any
pub async fn get_last_sync(pool: &QueuePool) -> QueueResult<Option<DateTime<Utc>>> {
    let value: Option<String> =
        sqlx::query_scalar("SELECT value FROM sync_meta WHERE key = ?")
            .bind(LAST_SYNC_KEY)
            .fetch_optional(pool)
            .await
            .map_err(|e| QueueError::database("Failed to get last sync timestamp", e))?;

    let Some(value) = value else {
        return Ok(None);
    };

    let millis = value.parse::<i64>().map_err(|_| QueueError::CorruptRow {
        row_id: LAST_SYNC_KEY.to_string(),
        detail: format!("bad timestamp '{value}'"),
    })?;

    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(Some)
        .ok_or_else(|| QueueError::CorruptRow {
            row_id: LAST_SYNC_KEY.to_string(),
            detail: format!("out of range timestamp {millis}"),
        })
}
