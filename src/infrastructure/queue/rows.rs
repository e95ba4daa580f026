use crate::domain::entities::PendingSyncRecord;
use crate::domain::value_objects::{LocalId, OwnerId, SyncPayload};
use crate::shared::error::SyncError;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PendingSyncRow {
    pub seq: i64,
    pub record_id: String,
    pub domain: String,
    pub operation: String,
    pub local_id: i64,
    pub owner_id: i64,
    pub payload: String,
    pub enqueued_at: i64,
}

impl TryFrom<PendingSyncRow> for PendingSyncRecord {
    type Error = SyncError;

    fn try_from(row: PendingSyncRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, err: String| {
            SyncError::Queue(format!("pending_sync row {} has invalid {field}: {err}", row.seq))
        };

        Ok(PendingSyncRecord {
            record_id: row
                .record_id
                .parse()
                .map_err(|e| corrupt("record_id", e))?,
            domain: row.domain.parse().map_err(|e| corrupt("domain", e))?,
            operation: row
                .operation
                .parse()
                .map_err(|e| corrupt("operation", e))?,
            local_id: LocalId::new(row.local_id).map_err(|e| corrupt("local_id", e))?,
            owner_id: OwnerId::new(row.owner_id).map_err(|e| corrupt("owner_id", e))?,
            payload: SyncPayload::from_json_str(&row.payload)
                .map_err(|e| corrupt("payload", e))?,
            enqueued_at: DateTime::from_timestamp_millis(row.enqueued_at)
                .ok_or_else(|| corrupt("enqueued_at", row.enqueued_at.to_string()))?,
        })
    }
}
