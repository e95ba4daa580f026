pub mod reconciliation_supervisor;

pub use reconciliation_supervisor::{ReconciliationSupervisor, SupervisorOptions};
