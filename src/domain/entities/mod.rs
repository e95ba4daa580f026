pub mod apply_outcome;
pub mod domain_mutation;
pub mod domain_sync_status;
pub mod pending_sync_record;
pub mod reconcile_report;

pub use apply_outcome::ApplyOutcome;
pub use domain_mutation::DomainMutation;
pub use domain_sync_status::DomainSyncStatus;
pub use pending_sync_record::PendingSyncRecord;
pub use reconcile_report::ReconcileReport;
