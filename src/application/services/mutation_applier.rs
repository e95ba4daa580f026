use crate::application::ports::{LocalStore, QueueStore, RemoteConnector, RemoteWrite};
use crate::domain::entities::{ApplyOutcome, DomainMutation, PendingSyncRecord};
use crate::domain::registry::{DomainRegistry, TableSpec};
use crate::domain::value_objects::{LocalId, OwnerId, SyncDomain, SyncPayload};
use crate::shared::error::{RemoteError, SyncError};
use crate::shared::keyed_locks::KeyedLocks;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Inline write path: local commit, one bounded remote attempt, queue on failure.
pub struct MutationApplier {
    registry: Arc<DomainRegistry>,
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteConnector>,
    queue: Arc<dyn QueueStore>,
    remote_timeout: Duration,
    entities: KeyedLocks<(SyncDomain, LocalId)>,
}

impl MutationApplier {
    pub fn new(
        registry: Arc<DomainRegistry>,
        local: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteConnector>,
        queue: Arc<dyn QueueStore>,
        remote_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            local,
            remote,
            queue,
            remote_timeout,
            entities: KeyedLocks::new(),
        }
    }

    /// Only `LocalWriteFailed` and `InvalidMutation` come back as errors; once
    /// the local write has committed every remote-side failure is absorbed.
    pub async fn apply(&self, mutation: DomainMutation) -> Result<ApplyOutcome, SyncError> {
        let DomainMutation {
            domain,
            operation,
            owner_id,
            local_id,
            fields,
        } = mutation;

        let (spec, procedure) = self.registry.lookup(domain, operation).ok_or_else(|| {
            SyncError::InvalidMutation(format!("{operation} is not supported for {domain}"))
        })?;
        let table = &spec.table;
        let payload = spec
            .prepare_payload(procedure, fields)
            .map_err(SyncError::InvalidMutation)?;

        if table.owner_column.is_some() && owner_id.is_none() {
            return Err(SyncError::InvalidMutation(format!(
                "{operation} on {domain} requires an owner id"
            )));
        }

        // Held from the local write until the record is queued or synced, so
        // two mutations of one entity reach the remote in local commit order.
        let _entity_guard = match local_id {
            Some(id) if !operation.is_insert() => Some(self.entities.lock((domain, id)).await),
            _ => None,
        };
        let (local_id, payload) = if operation.is_insert() {
            if local_id.is_some() {
                return Err(SyncError::InvalidMutation(
                    "Insert must not carry a local id; the local store assigns it".to_string(),
                ));
            }
            let local_id = self.local.insert(table, owner_id, &payload).await?;
            let payload = self.hydrate(table, local_id, payload).await;
            (local_id, payload)
        } else {
            let local_id = local_id.ok_or_else(|| {
                SyncError::InvalidMutation(format!("{operation} on {domain} requires a local id"))
            })?;
            let rows = self
                .local
                .write(table, procedure, local_id, owner_id, &payload)
                .await?;
            if rows == 0 {
                return Err(SyncError::LocalWriteFailed(format!(
                    "no {domain} row with id {local_id} for this owner"
                )));
            }
            (local_id, payload)
        };

        let owner_id = match table.owner_column {
            Some(_) => owner_id.unwrap_or_else(|| OwnerId::from(local_id)),
            None => OwnerId::from(local_id),
        };

        let reason = if self.waits_behind_queue(domain, local_id).await {
            debug!(
                target: "sync::apply",
                domain = %domain,
                operation = %operation,
                local_id = %local_id,
                "earlier records for this entity are queued; skipping inline remote write"
            );
            "earlier records for this entity are still queued".to_string()
        } else {
            let attempt = self
                .push_remote(RemoteWrite {
                    table,
                    procedure,
                    local_id,
                    owner_id,
                    payload: &payload,
                })
                .await;

            match attempt {
                Ok(rows) => {
                    if rows == 0 && !operation.is_insert() {
                        warn!(
                            target: "sync::apply",
                            domain = %domain,
                            operation = %operation,
                            local_id = %local_id,
                            "remote write matched no rows"
                        );
                    }
                    debug!(
                        target: "sync::apply",
                        domain = %domain,
                        operation = %operation,
                        local_id = %local_id,
                        "mutation synced to both stores"
                    );
                    return Ok(ApplyOutcome::Synced { local_id });
                }
                Err(err) => {
                    let err = SyncError::from(err);
                    warn!(
                        target: "sync::apply",
                        domain = %domain,
                        operation = %operation,
                        local_id = %local_id,
                        error = %err,
                        "remote write failed; queueing for reconciliation"
                    );
                    err.to_string()
                }
            }
        };

        let record = PendingSyncRecord::new(domain, operation, local_id, owner_id, payload);
        match self.queue.append(domain, &record).await {
            Ok(()) => Ok(ApplyOutcome::QueuedForSync {
                local_id,
                record_id: record.record_id,
            }),
            Err(queue_err) => {
                error!(
                    target: "sync::apply",
                    domain = %domain,
                    operation = %operation,
                    local_id = %local_id,
                    error = %queue_err,
                    pending_reason = %reason,
                    "queue append failed; mutation is committed locally only"
                );
                Ok(ApplyOutcome::LocalOnly {
                    local_id,
                    reason: SyncError::QueueAppendFailed(queue_err.to_string()).to_string(),
                })
            }
        }
    }

    /// True when the queue still holds records for this entity, or when that
    /// cannot be determined.
    async fn waits_behind_queue(&self, domain: SyncDomain, local_id: LocalId) -> bool {
        match self.queue.has_pending(domain, local_id).await {
            Ok(pending) => pending,
            Err(err) => {
                warn!(
                    target: "sync::apply",
                    domain = %domain,
                    local_id = %local_id,
                    error = %err,
                    "could not inspect the queue; treating the entity as pending"
                );
                true
            }
        }
    }

    /// Reads the committed row back so the replicated payload carries the
    /// values the local store defaulted.
    async fn hydrate(
        &self,
        table: &TableSpec,
        local_id: LocalId,
        submitted: SyncPayload,
    ) -> SyncPayload {
        match self.local.fetch_row(table, local_id).await {
            Ok(Some(row)) => row,
            Ok(None) => {
                warn!(
                    target: "sync::apply",
                    table = table.table,
                    local_id = %local_id,
                    "inserted row not found on read-back; using submitted fields"
                );
                submitted
            }
            Err(err) => {
                warn!(
                    target: "sync::apply",
                    table = table.table,
                    local_id = %local_id,
                    error = %err,
                    "read-back after insert failed; using submitted fields"
                );
                submitted
            }
        }
    }

    async fn push_remote(&self, write: RemoteWrite<'_>) -> Result<u64, RemoteError> {
        let attempt = async {
            let mut session = self.remote.acquire().await?;
            let result = session.commit_write(write).await;
            session.close().await;
            result
        };

        tokio::time::timeout(self.remote_timeout, attempt)
            .await
            .map_err(|_| RemoteError::Timeout(self.remote_timeout))?
    }
}
