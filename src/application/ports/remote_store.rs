use crate::domain::registry::{TableSpec, WriteProcedure};
use crate::domain::value_objects::{LocalId, OwnerId, SyncPayload};
use crate::shared::error::RemoteError;
use async_trait::async_trait;

/// One replicated write, keyed by the local id.
#[derive(Debug, Clone, Copy)]
pub struct RemoteWrite<'a> {
    pub table: &'a TableSpec,
    pub procedure: WriteProcedure,
    pub local_id: LocalId,
    pub owner_id: OwnerId,
    pub payload: &'a SyncPayload,
}

#[async_trait]
pub trait RemoteConnector: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn RemoteSession>, RemoteError>;
}

#[async_trait]
pub trait RemoteSession: Send {
    /// Executes `write` and commits it. Inserts must be upserts by id so a
    /// replay after a lost acknowledgement has no extra effect.
    async fn commit_write(&mut self, write: RemoteWrite<'_>) -> Result<u64, RemoteError>;

    async fn close(self: Box<Self>);
}
