use crate::domain::registry::{TableSpec, WriteProcedure};
use crate::domain::value_objects::{LocalId, OwnerId, SyncPayload};
use crate::shared::error::SyncError;
use async_trait::async_trait;

/// The store the application reads from. Authoritative for ids and for
/// whether a mutation committed.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn insert(
        &self,
        table: &TableSpec,
        owner_id: Option<OwnerId>,
        payload: &SyncPayload,
    ) -> Result<LocalId, SyncError>;

    /// Applies a non-insert procedure and returns the affected row count.
    async fn write(
        &self,
        table: &TableSpec,
        procedure: WriteProcedure,
        local_id: LocalId,
        owner_id: Option<OwnerId>,
        payload: &SyncPayload,
    ) -> Result<u64, SyncError>;

    /// Current column values of a row, without its id and owner columns.
    async fn fetch_row(
        &self,
        table: &TableSpec,
        local_id: LocalId,
    ) -> Result<Option<SyncPayload>, SyncError>;
}
