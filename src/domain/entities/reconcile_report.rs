use crate::domain::value_objects::SyncDomain;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconcileReport {
    pub domain: SyncDomain,
    pub pending_before: u32,
    pub attempted: u32,
    pub synced: u32,
    pub failed: u32,
    /// Held back because an earlier record for the same entity failed this cycle.
    pub deferred: u32,
    pub remaining: u32,
    /// The cycle stopped early because no remote session could be obtained.
    pub aborted: bool,
    pub last_error: Option<String>,
}

impl ReconcileReport {
    pub fn empty(domain: SyncDomain) -> Self {
        Self {
            domain,
            pending_before: 0,
            attempted: 0,
            synced: 0,
            failed: 0,
            deferred: 0,
            remaining: 0,
            aborted: false,
            last_error: None,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.remaining == 0 && !self.aborted
    }
}
