pub mod mutation_applier;
pub mod reconciliation_service;
pub mod sync_executor;

pub use mutation_applier::MutationApplier;
pub use reconciliation_service::ReconciliationService;
pub use sync_executor::{ReplayOutcome, SyncExecutor};
