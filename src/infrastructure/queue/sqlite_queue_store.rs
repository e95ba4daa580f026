use super::rows::PendingSyncRow;
use crate::application::ports::QueueStore;
use crate::domain::entities::PendingSyncRecord;
use crate::domain::value_objects::{LocalId, SyncDomain, SyncRecordId};
use crate::infrastructure::database::ConnectionPool;
use crate::shared::error::SyncError;
use crate::shared::keyed_locks::KeyedLocks;
use async_trait::async_trait;
use tracing::{debug, error};

/// Queue kept in the `pending_sync` table; FIFO by `seq` within a domain.
pub struct SqliteQueueStore {
    pool: ConnectionPool,
    locks: KeyedLocks<SyncDomain>,
}

impl SqliteQueueStore {
    pub fn new(pool: ConnectionPool) -> Self {
        Self {
            pool,
            locks: KeyedLocks::new(),
        }
    }

    async fn insert(&self, record: &PendingSyncRecord) -> Result<(), SyncError> {
        let payload = record.payload.to_json_string()?;
        sqlx::query(
            r#"
            INSERT INTO pending_sync
                (record_id, domain, operation, local_id, owner_id, payload, enqueued_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(record.record_id.to_string())
        .bind(record.domain.as_str())
        .bind(record.operation.as_str())
        .bind(record.local_id.value())
        .bind(record.owner_id.value())
        .bind(payload)
        .bind(record.enqueued_at.timestamp_millis())
        .execute(self.pool.get_pool())
        .await?;
        Ok(())
    }
}

#[async_trait]
impl QueueStore for SqliteQueueStore {
    async fn append(
        &self,
        domain: SyncDomain,
        record: &PendingSyncRecord,
    ) -> Result<(), SyncError> {
        if record.domain != domain {
            return Err(SyncError::QueueAppendFailed(format!(
                "record for {} cannot be queued under {domain}",
                record.domain
            )));
        }

        let _guard = self.locks.lock(domain).await;
        self.insert(record).await.map_err(|err| {
            error!(
                target: "sync::queue",
                domain = %domain,
                record_id = %record.record_id,
                error = %err,
                "failed to persist pending record"
            );
            SyncError::QueueAppendFailed(err.to_string())
        })?;

        debug!(
            target: "sync::queue",
            domain = %domain,
            record_id = %record.record_id,
            operation = %record.operation,
            "pending record appended"
        );
        Ok(())
    }

    async fn load(&self, domain: SyncDomain) -> Result<Vec<PendingSyncRecord>, SyncError> {
        let _guard = self.locks.lock(domain).await;
        let rows: Vec<PendingSyncRow> = sqlx::query_as(
            r#"
            SELECT seq, record_id, domain, operation, local_id, owner_id, payload, enqueued_at
            FROM pending_sync
            WHERE domain = ?1
            ORDER BY seq ASC
            "#,
        )
        .bind(domain.as_str())
        .fetch_all(self.pool.get_pool())
        .await?;

        rows.into_iter().map(PendingSyncRecord::try_from).collect()
    }

    async fn remove(
        &self,
        domain: SyncDomain,
        record_ids: &[SyncRecordId],
    ) -> Result<usize, SyncError> {
        if record_ids.is_empty() {
            return Ok(0);
        }

        let _guard = self.locks.lock(domain).await;
        let mut tx = self.pool.get_pool().begin().await?;
        let mut removed = 0u64;
        for record_id in record_ids {
            removed += sqlx::query("DELETE FROM pending_sync WHERE domain = ?1 AND record_id = ?2")
                .bind(domain.as_str())
                .bind(record_id.to_string())
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;

        debug!(target: "sync::queue", domain = %domain, removed, "pending records removed");
        Ok(removed as usize)
    }

    async fn pending_count(&self, domain: SyncDomain) -> Result<usize, SyncError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pending_sync WHERE domain = ?1")
            .bind(domain.as_str())
            .fetch_one(self.pool.get_pool())
            .await?;
        Ok(count as usize)
    }

    async fn has_pending(&self, domain: SyncDomain, local_id: LocalId) -> Result<bool, SyncError> {
        let _guard = self.locks.lock(domain).await;
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM pending_sync WHERE domain = ?1 AND local_id = ?2)",
        )
        .bind(domain.as_str())
        .bind(local_id.value())
        .fetch_one(self.pool.get_pool())
        .await?;
        Ok(exists)
    }
}
