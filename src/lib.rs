pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use application::ports::{LocalStore, QueueStore, RemoteConnector, RemoteSession, RemoteWrite};
pub use domain::{
    ApplyOutcome, DomainMutation, DomainRegistry, DomainSyncStatus, LocalId, OwnerId,
    PendingSyncRecord, ReconcileReport, SyncDomain, SyncOperation, SyncPayload, SyncRecordId,
};
pub use shared::{AppConfig, RemoteError, SyncError};
pub use state::SyncEngine;

/// Installs the global subscriber. `RUST_LOG` overrides the default filter;
/// `MELONY_LOG_JSON=1` switches to JSON lines.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "melony_sync=debug,info".into());
    let json = std::env::var("MELONY_LOG_JSON")
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
