use crate::domain::entities::PendingSyncRecord;
use crate::domain::value_objects::{LocalId, SyncDomain, SyncRecordId};
use crate::shared::error::SyncError;
use async_trait::async_trait;

/// Durable, per-domain FIFO of pending sync records.
///
/// Implementations serialize access per domain so an `append` racing a
/// `load`/`remove` cycle neither loses nor duplicates records. Different
/// domains never block each other.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Returns only once the record is durable.
    async fn append(&self, domain: SyncDomain, record: &PendingSyncRecord)
        -> Result<(), SyncError>;

    /// All pending records for `domain`, oldest first.
    async fn load(&self, domain: SyncDomain) -> Result<Vec<PendingSyncRecord>, SyncError>;

    /// Atomically drops the given records, keeping the order of the rest.
    /// Returns how many records were actually removed.
    async fn remove(&self, domain: SyncDomain, record_ids: &[SyncRecordId])
        -> Result<usize, SyncError>;

    async fn pending_count(&self, domain: SyncDomain) -> Result<usize, SyncError> {
        Ok(self.load(domain).await?.len())
    }

    /// Whether any record for `local_id` is still waiting in `domain`.
    async fn has_pending(&self, domain: SyncDomain, local_id: LocalId) -> Result<bool, SyncError> {
        Ok(self
            .load(domain)
            .await?
            .iter()
            .any(|record| record.local_id == local_id))
    }
}
