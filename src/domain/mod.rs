pub mod entities;
pub mod registry;
pub mod value_objects;

pub use entities::{
    ApplyOutcome, DomainMutation, DomainSyncStatus, PendingSyncRecord, ReconcileReport,
};
pub use registry::{DomainRegistry, DomainSpec, OperationSpec, TableSpec, WriteProcedure};
pub use value_objects::{LocalId, OwnerId, SyncDomain, SyncOperation, SyncPayload, SyncRecordId};
