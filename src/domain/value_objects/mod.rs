pub mod local_id;
pub mod owner_id;
pub mod sync_domain;
pub mod sync_operation;
pub mod sync_payload;
pub mod sync_record_id;

pub use local_id::LocalId;
pub use owner_id::OwnerId;
pub use sync_domain::SyncDomain;
pub use sync_operation::SyncOperation;
pub use sync_payload::SyncPayload;
pub use sync_record_id::SyncRecordId;
