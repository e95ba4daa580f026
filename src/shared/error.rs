use std::time::Duration;
use thiserror::Error;

/// Failure of a single attempt against the remote store.
///
/// Every variant is retryable from the engine's point of view; the split only
/// exists so logs and status snapshots can tell an outage from a refusal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),

    #[error("remote store rejected the write: {0}")]
    Rejected(String),
}

impl RemoteError {
    pub fn is_transient(&self) -> bool {
        !matches!(self, RemoteError::Rejected(_))
    }
}

impl From<sqlx::Error> for RemoteError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err)
                if db_err.is_unique_violation()
                    || db_err.is_foreign_key_violation()
                    || db_err.is_check_violation() =>
            {
                RemoteError::Rejected(err.to_string())
            }
            sqlx::Error::ColumnNotFound(_) | sqlx::Error::TypeNotFound { .. } => {
                RemoteError::Rejected(err.to_string())
            }
            _ => RemoteError::Unavailable(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Local write failed: {0}")]
    LocalWriteFailed(String),

    #[error("Remote write failed: {0}")]
    RemoteWriteFailed(String),

    #[error("Remote write rejected: {0}")]
    RemoteWriteRejected(String),

    #[error("Queue append failed: {0}")]
    QueueAppendFailed(String),

    #[error("Replay failed: {0}")]
    ReplayFailed(String),

    #[error("Invalid mutation: {0}")]
    InvalidMutation(String),

    #[error("Queue store error: {0}")]
    Queue(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<RemoteError> for SyncError {
    fn from(err: RemoteError) -> Self {
        if err.is_transient() {
            SyncError::RemoteWriteFailed(err.to_string())
        } else {
            SyncError::RemoteWriteRejected(err.to_string())
        }
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        SyncError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for SyncError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        SyncError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Queue(err.to_string())
    }
}
