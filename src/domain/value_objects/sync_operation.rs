use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    Insert,
    Update,
    SoftDelete,
    /// Hard delete; only registered for domains the remote schema never flags.
    Delete,
    UpdateEmail,
    UpdatePassword,
}

impl SyncOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOperation::Insert => "insert",
            SyncOperation::Update => "update",
            SyncOperation::SoftDelete => "soft_delete",
            SyncOperation::Delete => "delete",
            SyncOperation::UpdateEmail => "update_email",
            SyncOperation::UpdatePassword => "update_password",
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, SyncOperation::Insert)
    }
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insert" => Ok(SyncOperation::Insert),
            "update" => Ok(SyncOperation::Update),
            "soft_delete" => Ok(SyncOperation::SoftDelete),
            "delete" => Ok(SyncOperation::Delete),
            "update_email" => Ok(SyncOperation::UpdateEmail),
            "update_password" => Ok(SyncOperation::UpdatePassword),
            other => Err(format!("Unknown sync operation: {other}")),
        }
    }
}
