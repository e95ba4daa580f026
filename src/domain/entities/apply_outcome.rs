use crate::domain::value_objects::{LocalId, SyncRecordId};
use serde::{Deserialize, Serialize};

/// Result of a mutation whose local write committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// Both stores have the change.
    Synced { local_id: LocalId },
    /// The remote attempt failed; a pending record will replay it.
    QueuedForSync {
        local_id: LocalId,
        record_id: SyncRecordId,
    },
    /// The remote attempt failed and the queue could not persist the record.
    LocalOnly { local_id: LocalId, reason: String },
}

impl ApplyOutcome {
    pub fn local_id(&self) -> LocalId {
        match self {
            ApplyOutcome::Synced { local_id }
            | ApplyOutcome::QueuedForSync { local_id, .. }
            | ApplyOutcome::LocalOnly { local_id, .. } => *local_id,
        }
    }

    pub fn is_synced(&self) -> bool {
        matches!(self, ApplyOutcome::Synced { .. })
    }

    pub fn is_queued(&self) -> bool {
        matches!(self, ApplyOutcome::QueuedForSync { .. })
    }
}
