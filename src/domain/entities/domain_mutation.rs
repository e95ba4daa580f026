use crate::domain::value_objects::{LocalId, OwnerId, SyncDomain, SyncOperation, SyncPayload};

/// What a request handler asks the engine to commit.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainMutation {
    pub domain: SyncDomain,
    pub operation: SyncOperation,
    /// Required for every domain that has an owner column.
    pub owner_id: Option<OwnerId>,
    /// `None` on insert; the local store assigns it.
    pub local_id: Option<LocalId>,
    pub fields: SyncPayload,
}

impl DomainMutation {
    pub fn insert(domain: SyncDomain, owner_id: Option<OwnerId>, fields: SyncPayload) -> Self {
        Self {
            domain,
            operation: SyncOperation::Insert,
            owner_id,
            local_id: None,
            fields,
        }
    }

    pub fn update(
        domain: SyncDomain,
        local_id: LocalId,
        owner_id: Option<OwnerId>,
        fields: SyncPayload,
    ) -> Self {
        Self::on_existing(domain, SyncOperation::Update, local_id, owner_id, fields)
    }

    pub fn soft_delete(domain: SyncDomain, local_id: LocalId, owner_id: Option<OwnerId>) -> Self {
        Self::on_existing(
            domain,
            SyncOperation::SoftDelete,
            local_id,
            owner_id,
            SyncPayload::empty(),
        )
    }

    pub fn on_existing(
        domain: SyncDomain,
        operation: SyncOperation,
        local_id: LocalId,
        owner_id: Option<OwnerId>,
        fields: SyncPayload,
    ) -> Self {
        Self {
            domain,
            operation,
            owner_id,
            local_id: Some(local_id),
            fields,
        }
    }
}
