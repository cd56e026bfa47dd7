// crates/queue/src/queries/operations.rs
//! Pending operation persistence

use crate::connection::QueuePool;
use crate::error::{QueueError, QueueResult};
use chrono::{DateTime, Utc};
use flightsync_core::{OperationKind, PendingOperation, RecordId, RecordType, StudentId};

/// Inserts a pending operation
pub async fn insert_operation(pool: &QueuePool, op: &PendingOperation) -> QueueResult<()> {
    sqlx::query(
        r#"
        INSERT INTO pending_operations
            (id, kind, student_id, record_id, record_type, payload,
             created_at, attempts, max_attempts, completed)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&op.id)
    .bind(op.kind.as_str())
    .bind(op.student.as_str())
    .bind(op.record_id.as_str())
    .bind(op.record_type.as_str())
    .bind(serde_json::to_string(&op.payload)?)
    .bind(op.created_at.timestamp_millis())
    .bind(op.attempts as i64)
    .bind(op.max_attempts as i64)
    .bind(op.completed as i64)
    .execute(pool)
    .await
    .map_err(|e| QueueError::database("Failed to insert pending operation", e))?;

    Ok(())
}

/// Operations still awaiting replay, oldest first. Excludes completed
/// operations and those at their attempt cap.
pub async fn replayable_operations(pool: &QueuePool) -> QueueResult<Vec<PendingOperation>> {
    let rows = sqlx::query(
        r#"
        SELECT id, kind, student_id, record_id, record_type, payload,
               created_at, attempts, max_attempts, completed
        FROM pending_operations
        WHERE completed = 0 AND attempts < max_attempts
        ORDER BY created_at ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| QueueError::database("Failed to list replayable operations", e))?;

    rows.into_iter().map(row_to_operation).collect()
}

/// Operations that used up their attempt cap without completing. These need
/// manual attention and are never replayed again.
pub async fn exhausted_operations(pool: &QueuePool) -> QueueResult<Vec<PendingOperation>> {
    let rows = sqlx::query(
        r#"
        SELECT id, kind, student_id, record_id, record_type, payload,
               created_at, attempts, max_attempts, completed
        FROM pending_operations
        WHERE completed = 0 AND attempts >= max_attempts
        ORDER BY created_at ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| QueueError::database("Failed to list exhausted operations", e))?;

    rows.into_iter().map(row_to_operation).collect()
}

/// Increments the attempt count of an operation, never past its cap
pub async fn record_attempt(pool: &QueuePool, id: &str) -> QueueResult<()> {
    sqlx::query(
        r#"
        UPDATE pending_operations
        SET attempts = MIN(attempts + 1, max_attempts)
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| QueueError::database("Failed to record attempt", e))?;

    Ok(())
}

/// Marks an operation as successfully replayed
pub async fn mark_complete(pool: &QueuePool, id: &str) -> QueueResult<()> {
    sqlx::query("UPDATE pending_operations SET completed = 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| QueueError::database("Failed to mark operation complete", e))?;

    Ok(())
}

/// Deletes completed operations, returning how many were removed
pub async fn delete_completed(pool: &QueuePool) -> QueueResult<u64> {
    let result = sqlx::query("DELETE FROM pending_operations WHERE completed = 1")
        .execute(pool)
        .await
        .map_err(|e| QueueError::database("Failed to delete completed operations", e))?;

    Ok(result.rows_affected())
}

/// Fetches one operation by ID
pub async fn get_operation(pool: &QueuePool, id: &str) -> QueueResult<Option<PendingOperation>> {
    let row = sqlx::query(
        r#"
        SELECT id, kind, student_id, record_id, record_type, payload,
               created_at, attempts, max_attempts, completed
        FROM pending_operations
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| QueueError::database("Failed to fetch operation", e))?;

    row.map(row_to_operation).transpose()
}

fn row_to_operation(row: sqlx::sqlite::SqliteRow) -> QueueResult<PendingOperation> {
    use sqlx::Row;

    let id: String = row
        .try_get("id")
        .map_err(|e| QueueError::database("Missing operation ID", e))?;

    let kind_str: String = row
        .try_get("kind")
        .map_err(|e| QueueError::database("Missing operation kind", e))?;
    let kind = OperationKind::parse(&kind_str).ok_or_else(|| QueueError::CorruptRow {
        row_id: id.clone(),
        detail: format!("unknown kind '{kind_str}'"),
    })?;

    let record_type_str: String = row
        .try_get("record_type")
        .map_err(|e| QueueError::database("Missing record type", e))?;
    let record_type =
        RecordType::parse(&record_type_str).map_err(|e| QueueError::CorruptRow {
            row_id: id.clone(),
            detail: e.to_string(),
        })?;

    let payload_str: String = row
        .try_get("payload")
        .map_err(|e| QueueError::database("Missing payload", e))?;
    let payload = serde_json::from_str(&payload_str)?;

    let student_id: String = row
        .try_get("student_id")
        .map_err(|e| QueueError::database("Missing student ID", e))?;
    let record_id: String = row
        .try_get("record_id")
        .map_err(|e| QueueError::database("Missing record ID", e))?;
    let created_at_ms: i64 = row
        .try_get("created_at")
        .map_err(|e| QueueError::database("Missing created_at", e))?;
    let attempts: i64 = row
        .try_get("attempts")
        .map_err(|e| QueueError::database("Missing attempts", e))?;
    let max_attempts: i64 = row
        .try_get("max_attempts")
        .map_err(|e| QueueError::database("Missing max_attempts", e))?;
    let completed: i64 = row
        .try_get("completed")
        .map_err(|e| QueueError::database("Missing completed flag", e))?;

    let created_at = DateTime::<Utc>::from_timestamp_millis(created_at_ms).ok_or_else(|| {
        QueueError::CorruptRow {
            row_id: id.clone(),
            detail: format!("bad timestamp {created_at_ms}"),
        }
    })?;

    Ok(PendingOperation {
        id,
        kind,
        student: StudentId::from_string(student_id),
        record_id: RecordId::from_string(record_id),
        record_type,
        payload,
        created_at,
        attempts: attempts as u32,
        max_attempts: max_attempts as u32,
        completed: completed != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::create_test_db;
    use crate::migrations::run_migrations;
    use serde_json::json;

    async fn setup() -> QueuePool {
        let pool = create_test_db().await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    fn operation(record: &str) -> PendingOperation {
        PendingOperation::new(
            OperationKind::Save,
            StudentId::from_string("s-1"),
            RecordId::from_string(record),
            RecordType::ItemProgress,
            json!({"completed": true}),
        )
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let pool = setup().await;
        let op = operation("rec-1");

        insert_operation(&pool, &op).await.unwrap();
        let loaded = get_operation(&pool, &op.id).await.unwrap().unwrap();

        assert_eq!(loaded.kind, op.kind);
        assert_eq!(loaded.student, op.student);
        assert_eq!(loaded.record_id, op.record_id);
        assert_eq!(loaded.payload, op.payload);
        assert_eq!(loaded.attempts, 0);
        assert!(!loaded.completed);
    }

    #[tokio::test]
    async fn test_replayable_ordered_oldest_first() {
        let pool = setup().await;

        let mut first = operation("rec-1");
        first.created_at = Utc::now() - chrono::Duration::seconds(60);
        let second = operation("rec-2");

        insert_operation(&pool, &second).await.unwrap();
        insert_operation(&pool, &first).await.unwrap();

        let pending = replayable_operations(&pool).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, first.id);
        assert_eq!(pending[1].id, second.id);
    }

    #[tokio::test]
    async fn test_attempt_count_stops_at_cap() {
        let pool = setup().await;
        let op = operation("rec-1").with_max_attempts(2);
        insert_operation(&pool, &op).await.unwrap();

        for _ in 0..4 {
            record_attempt(&pool, &op.id).await.unwrap();
        }

        let loaded = get_operation(&pool, &op.id).await.unwrap().unwrap();
        assert_eq!(loaded.attempts, 2);
        assert!(loaded.is_exhausted());

        // Exhausted operations leave the replay set but are not dropped
        assert!(replayable_operations(&pool).await.unwrap().is_empty());
        let exhausted = exhausted_operations(&pool).await.unwrap();
        assert_eq!(exhausted.len(), 1);
        assert_eq!(exhausted[0].id, op.id);
    }

    #[tokio::test]
    async fn test_mark_complete_and_cleanup() {
        let pool = setup().await;
        let op = operation("rec-1");
        insert_operation(&pool, &op).await.unwrap();

        mark_complete(&pool, &op.id).await.unwrap();
        assert!(replayable_operations(&pool).await.unwrap().is_empty());

        let removed = delete_completed(&pool).await.unwrap();
        assert_eq!(removed, 1);
        assert!(get_operation(&pool, &op.id).await.unwrap().is_none());
    }
}
