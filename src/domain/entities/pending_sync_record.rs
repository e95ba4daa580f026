use crate::domain::value_objects::{
    LocalId, OwnerId, SyncDomain, SyncOperation, SyncPayload, SyncRecordId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A mutation already committed locally whose remote replication is still owed.
///
/// Records are immutable: they are appended once and later removed as a whole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingSyncRecord {
    pub record_id: SyncRecordId,
    pub domain: SyncDomain,
    pub operation: SyncOperation,
    pub local_id: LocalId,
    pub owner_id: OwnerId,
    pub payload: SyncPayload,
    pub enqueued_at: DateTime<Utc>,
}

impl PendingSyncRecord {
    pub fn new(
        domain: SyncDomain,
        operation: SyncOperation,
        local_id: LocalId,
        owner_id: OwnerId,
        payload: SyncPayload,
    ) -> Self {
        Self {
            record_id: SyncRecordId::generate(),
            domain,
            operation,
            local_id,
            owner_id,
            payload,
            enqueued_at: Utc::now(),
        }
    }
}
