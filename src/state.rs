use crate::application::ports::{LocalStore, QueueStore, RemoteConnector};
use crate::application::services::{MutationApplier, ReconciliationService, SyncExecutor};
use crate::domain::entities::{ApplyOutcome, DomainMutation, DomainSyncStatus, ReconcileReport};
use crate::domain::registry::DomainRegistry;
use crate::domain::value_objects::SyncDomain;
use crate::infrastructure::database::{ConnectionPool, SqliteLocalStore};
use crate::infrastructure::jobs::{ReconciliationSupervisor, SupervisorOptions};
use crate::infrastructure::queue::{JsonFileQueueStore, SqliteQueueStore};
use crate::infrastructure::remote::SqlxRemoteConnector;
use crate::shared::config::{AppConfig, QueueBackend};
use crate::shared::error::SyncError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a host needs: the inline `apply` path and the background
/// reconciliation lifecycle, wired from one `AppConfig`.
pub struct SyncEngine {
    config: AppConfig,
    registry: Arc<DomainRegistry>,
    applier: MutationApplier,
    reconciliation: Arc<ReconciliationService>,
    supervisor: Arc<ReconciliationSupervisor>,
    pools: Vec<ConnectionPool>,
}

impl SyncEngine {
    pub async fn new(config: AppConfig) -> Result<Self, SyncError> {
        config.validate().map_err(SyncError::Configuration)?;

        let local_pool = ConnectionPool::new(&config.local.url, config.local.max_connections).await?;
        local_pool.migrate_finance().await?;

        let remote_pool = ConnectionPool::lazy(
            &config.remote.url,
            config.remote.max_connections,
            config.remote.timeout(),
        )?;
        if let Err(err) = remote_pool.migrate_finance().await {
            warn!(
                target: "sync::scheduler",
                error = %err,
                "remote schema not verified; remote may be offline"
            );
        }

        let mut pools = vec![local_pool.clone(), remote_pool.clone()];

        let queue: Arc<dyn QueueStore> = match config.queue.backend {
            QueueBackend::Sqlite => {
                let queue_pool =
                    ConnectionPool::new(&config.queue.url, config.local.max_connections).await?;
                queue_pool.migrate_queue().await?;
                pools.push(queue_pool.clone());
                Arc::new(SqliteQueueStore::new(queue_pool))
            }
            QueueBackend::JsonFile => Arc::new(JsonFileQueueStore::new(&config.queue.dir)),
        };

        info!(
            target: "sync::scheduler",
            queue_backend = ?config.queue.backend,
            remote_timeout_ms = config.remote.timeout_ms,
            "sync engine initialized"
        );

        let mut engine = Self::from_parts(
            config,
            Arc::new(DomainRegistry::standard()),
            Arc::new(SqliteLocalStore::new(local_pool)),
            Arc::new(SqlxRemoteConnector::new(remote_pool)),
            queue,
        );
        engine.pools = pools;
        Ok(engine)
    }

    /// Wires the engine around caller-supplied stores.
    pub fn from_parts(
        config: AppConfig,
        registry: Arc<DomainRegistry>,
        local: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteConnector>,
        queue: Arc<dyn QueueStore>,
    ) -> Self {
        let timeout = config.remote.timeout();

        let applier = MutationApplier::new(
            Arc::clone(&registry),
            local,
            Arc::clone(&remote),
            Arc::clone(&queue),
            timeout,
        );
        let reconciliation = Arc::new(ReconciliationService::new(
            queue,
            remote,
            SyncExecutor::new(Arc::clone(&registry), timeout),
        ));
        let supervisor = ReconciliationSupervisor::new(
            Arc::clone(&reconciliation),
            SupervisorOptions {
                interval: config.sync.interval(),
                run_on_startup: config.sync.run_on_startup,
            },
        );

        Self {
            config,
            registry,
            applier,
            reconciliation,
            supervisor,
            pools: Vec::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &DomainRegistry {
        &self.registry
    }

    pub async fn apply(&self, mutation: DomainMutation) -> Result<ApplyOutcome, SyncError> {
        self.applier.apply(mutation).await
    }

    /// One cycle for `domain`, serialized with any scheduled run.
    pub async fn reconcile(&self, domain: SyncDomain) -> Result<ReconcileReport, SyncError> {
        self.supervisor.trigger(domain).await
    }

    pub async fn reconcile_all(&self) -> BTreeMap<SyncDomain, Result<ReconcileReport, SyncError>> {
        let domains: Vec<_> = self.registry.domains().collect();
        let runs = domains
            .iter()
            .map(|domain| self.reconciliation.reconcile(*domain));
        let results = futures::future::join_all(runs).await;
        domains.into_iter().zip(results).collect()
    }

    pub async fn status(&self, domain: SyncDomain) -> DomainSyncStatus {
        self.reconciliation.status(domain).await
    }

    pub async fn statuses(&self) -> BTreeMap<SyncDomain, DomainSyncStatus> {
        self.reconciliation.statuses().await
    }

    pub async fn pending_count(&self, domain: SyncDomain) -> Result<usize, SyncError> {
        self.reconciliation.pending_count(domain).await
    }

    /// Starts the periodic tasks when `sync.auto_sync` is set.
    pub async fn start(&self) {
        if !self.config.sync.auto_sync {
            info!(target: "sync::scheduler", "auto sync disabled; reconciliation runs on demand only");
            return;
        }
        self.supervisor.start(self.registry.domains()).await;
    }

    pub async fn shutdown(&self) {
        self.supervisor.shutdown().await;
        for pool in &self.pools {
            pool.close().await;
        }
    }
}
