use super::sync_executor::{ReplayOutcome, SyncExecutor};
use crate::application::ports::{QueueStore, RemoteConnector, RemoteSession};
use crate::domain::entities::{DomainSyncStatus, ReconcileReport};
use crate::domain::value_objects::{LocalId, SyncDomain};
use crate::shared::error::{RemoteError, SyncError};
use crate::shared::keyed_locks::KeyedLocks;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Drains one domain's queue against the remote store per call.
///
/// Runs for the same domain are serialized by a per-domain gate; different
/// domains reconcile concurrently.
pub struct ReconciliationService {
    queue: Arc<dyn QueueStore>,
    remote: Arc<dyn RemoteConnector>,
    executor: SyncExecutor,
    gates: KeyedLocks<SyncDomain>,
    statuses: RwLock<BTreeMap<SyncDomain, DomainSyncStatus>>,
}

impl ReconciliationService {
    pub fn new(
        queue: Arc<dyn QueueStore>,
        remote: Arc<dyn RemoteConnector>,
        executor: SyncExecutor,
    ) -> Self {
        Self {
            queue,
            remote,
            executor,
            gates: KeyedLocks::new(),
            statuses: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn reconcile(&self, domain: SyncDomain) -> Result<ReconcileReport, SyncError> {
        let _gate = self.gates.lock(domain).await;

        self.statuses
            .write()
            .await
            .entry(domain)
            .or_default()
            .is_syncing = true;

        let result = self.run_cycle(domain).await;
        let finished_at = Utc::now().timestamp();

        let mut statuses = self.statuses.write().await;
        let status = statuses.entry(domain).or_default();
        match &result {
            Ok(report) => {
                status.record_run(report, finished_at);
                if report.pending_before > 0 {
                    info!(
                        target: "sync::reconcile",
                        domain = %domain,
                        pending_before = report.pending_before,
                        synced = report.synced,
                        failed = report.failed,
                        deferred = report.deferred,
                        remaining = report.remaining,
                        aborted = report.aborted,
                        "reconciliation cycle finished"
                    );
                }
            }
            Err(err) => {
                status.record_error(err.to_string(), finished_at);
                error!(
                    target: "sync::reconcile",
                    domain = %domain,
                    error = %err,
                    "reconciliation cycle failed"
                );
            }
        }

        result
    }

    /// Snapshot with `pending` read from the queue, so records appended
    /// since the last run are counted.
    pub async fn status(&self, domain: SyncDomain) -> DomainSyncStatus {
        let mut status = self
            .statuses
            .read()
            .await
            .get(&domain)
            .cloned()
            .unwrap_or_default();
        self.refresh_pending(domain, &mut status).await;
        status
    }

    pub async fn statuses(&self) -> BTreeMap<SyncDomain, DomainSyncStatus> {
        let mut statuses = self.statuses.read().await.clone();
        for (domain, status) in statuses.iter_mut() {
            self.refresh_pending(*domain, status).await;
        }
        statuses
    }

    async fn refresh_pending(&self, domain: SyncDomain, status: &mut DomainSyncStatus) {
        match self.queue.pending_count(domain).await {
            Ok(count) => status.pending = count as u32,
            Err(err) => warn!(
                target: "sync::reconcile",
                domain = %domain,
                error = %err,
                "could not count pending records; status keeps the last known value"
            ),
        }
    }

    pub async fn pending_count(&self, domain: SyncDomain) -> Result<usize, SyncError> {
        self.queue.pending_count(domain).await
    }

    async fn run_cycle(&self, domain: SyncDomain) -> Result<ReconcileReport, SyncError> {
        let records = self.queue.load(domain).await?;
        let mut report = ReconcileReport::empty(domain);
        report.pending_before = records.len() as u32;
        report.remaining = report.pending_before;

        if records.is_empty() {
            return Ok(report);
        }

        let mut session = match self.acquire().await {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(
                    target: "sync::reconcile",
                    domain = %domain,
                    pending = records.len(),
                    error = %err,
                    "remote store unreachable; cycle aborted"
                );
                report.aborted = true;
                report.last_error = Some(err.to_string());
                return Ok(report);
            }
        };

        let mut completed = Vec::new();
        let mut failed_entities: HashSet<LocalId> = HashSet::new();

        for record in &records {
            if failed_entities.contains(&record.local_id) {
                report.deferred += 1;
                continue;
            }

            if session.is_none() {
                match self.acquire().await {
                    Ok(fresh) => session = Some(fresh),
                    Err(err) => {
                        warn!(
                            target: "sync::reconcile",
                            domain = %domain,
                            error = %err,
                            "could not re-acquire remote session; remaining records kept"
                        );
                        report.aborted = true;
                        report.last_error = Some(err.to_string());
                        break;
                    }
                }
            }
            let Some(active) = session.as_mut() else {
                break;
            };

            report.attempted += 1;
            match self.executor.replay(domain, active.as_mut(), record).await {
                ReplayOutcome::Success { .. } => {
                    report.synced += 1;
                    completed.push(record.record_id.clone());
                }
                ReplayOutcome::Retryable {
                    reason,
                    session_lost,
                } => {
                    report.failed += 1;
                    report.last_error = Some(reason);
                    failed_entities.insert(record.local_id);
                    if session_lost {
                        if let Some(stale) = session.take() {
                            stale.close().await;
                        }
                    }
                }
            }
        }

        if let Some(active) = session.take() {
            active.close().await;
        }

        if !completed.is_empty() {
            self.queue.remove(domain, &completed).await?;
        }
        report.remaining = (records.len() - completed.len()) as u32;

        Ok(report)
    }

    async fn acquire(&self) -> Result<Box<dyn RemoteSession>, RemoteError> {
        let timeout = self.executor.timeout();
        tokio::time::timeout(timeout, self.remote.acquire())
            .await
            .map_err(|_| RemoteError::Timeout(timeout))?
    }
}
