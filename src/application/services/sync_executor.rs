use crate::application::ports::{RemoteSession, RemoteWrite};
use crate::domain::entities::PendingSyncRecord;
use crate::domain::registry::{DomainRegistry, WriteProcedure};
use crate::domain::value_objects::SyncDomain;
use crate::shared::error::{RemoteError, SyncError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayOutcome {
    Success { rows_affected: u64 },
    /// The record stays queued. `session_lost` asks the caller to drop the
    /// session and acquire a fresh one before the next record.
    Retryable { reason: String, session_lost: bool },
}

impl ReplayOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ReplayOutcome::Success { .. })
    }
}

/// Maps a queued record back onto its domain's remote write procedure.
pub struct SyncExecutor {
    registry: Arc<DomainRegistry>,
    timeout: Duration,
}

impl SyncExecutor {
    pub fn new(registry: Arc<DomainRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Never drops a record on its own judgement: every failure, including a
    /// rejected payload or an operation the registry no longer knows, is
    /// `Retryable`.
    pub async fn replay(
        &self,
        domain: SyncDomain,
        session: &mut dyn RemoteSession,
        record: &PendingSyncRecord,
    ) -> ReplayOutcome {
        let Some((spec, procedure)) = self.registry.lookup(domain, record.operation) else {
            let reason = SyncError::ReplayFailed(format!(
                "no write procedure registered for {} {}",
                domain, record.operation
            ));
            warn!(
                target: "sync::reconcile",
                domain = %domain,
                record_id = %record.record_id,
                error = %reason,
                "record kept in queue"
            );
            return ReplayOutcome::Retryable {
                reason: reason.to_string(),
                session_lost: false,
            };
        };

        let write = RemoteWrite {
            table: &spec.table,
            procedure,
            local_id: record.local_id,
            owner_id: record.owner_id,
            payload: &record.payload,
        };

        let result = match tokio::time::timeout(self.timeout, session.commit_write(write)).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout(self.timeout)),
        };

        match result {
            Ok(rows_affected) => {
                if rows_affected == 0 && matches!(procedure, WriteProcedure::UpdateColumns(_)) {
                    warn!(
                        target: "sync::reconcile",
                        domain = %domain,
                        local_id = %record.local_id,
                        operation = %record.operation,
                        "no rows updated on remote"
                    );
                }
                debug!(
                    target: "sync::reconcile",
                    domain = %domain,
                    record_id = %record.record_id,
                    local_id = %record.local_id,
                    operation = %record.operation,
                    rows_affected,
                    "record replayed"
                );
                ReplayOutcome::Success { rows_affected }
            }
            Err(err) => {
                let session_lost = err.is_transient();
                let reason = SyncError::ReplayFailed(err.to_string());
                warn!(
                    target: "sync::reconcile",
                    domain = %domain,
                    record_id = %record.record_id,
                    local_id = %record.local_id,
                    operation = %record.operation,
                    error = %reason,
                    "replay failed; record kept for next cycle"
                );
                ReplayOutcome::Retryable {
                    reason: reason.to_string(),
                    session_lost,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{LocalId, OwnerId, SyncOperation, SyncPayload};
    use async_trait::async_trait;
    use serde_json::json;

    struct ScriptedSession {
        result: Result<u64, RemoteError>,
        delay: Option<Duration>,
        seen: Vec<(String, i64)>,
    }

    #[async_trait]
    impl RemoteSession for ScriptedSession {
        async fn commit_write(&mut self, write: RemoteWrite<'_>) -> Result<u64, RemoteError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.seen
                .push((write.table.table.to_string(), write.local_id.value()));
            self.result.clone()
        }

        async fn close(self: Box<Self>) {}
    }

    fn session(result: Result<u64, RemoteError>) -> ScriptedSession {
        ScriptedSession {
            result,
            delay: None,
            seen: Vec::new(),
        }
    }

    fn record(operation: SyncOperation) -> PendingSyncRecord {
        PendingSyncRecord::new(
            SyncDomain::Budget,
            operation,
            LocalId::new(5).unwrap(),
            OwnerId::new(1).unwrap(),
            SyncPayload::new(json!({"description": "groceries"})).unwrap(),
        )
    }

    fn executor(timeout: Duration) -> SyncExecutor {
        SyncExecutor::new(Arc::new(DomainRegistry::standard()), timeout)
    }

    #[tokio::test]
    async fn replays_against_the_domain_table_keyed_by_local_id() {
        let mut session = session(Ok(1));
        let outcome = executor(Duration::from_secs(1))
            .replay(SyncDomain::Budget, &mut session, &record(SyncOperation::Update))
            .await;

        assert_eq!(outcome, ReplayOutcome::Success { rows_affected: 1 });
        assert_eq!(session.seen, vec![("budget".to_string(), 5)]);
    }

    #[tokio::test]
    async fn zero_row_update_still_counts_as_success() {
        let mut session = session(Ok(0));
        let outcome = executor(Duration::from_secs(1))
            .replay(SyncDomain::Budget, &mut session, &record(SyncOperation::Update))
            .await;

        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn rejected_writes_are_retained_without_dropping_the_session() {
        let mut session = session(Err(RemoteError::Rejected("check constraint".into())));
        let outcome = executor(Duration::from_secs(1))
            .replay(SyncDomain::Budget, &mut session, &record(SyncOperation::Update))
            .await;

        match outcome {
            ReplayOutcome::Retryable { session_lost, .. } => assert!(!session_lost),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_remote_times_out_and_invalidates_the_session() {
        let mut session = ScriptedSession {
            delay: Some(Duration::from_millis(500)),
            ..session(Ok(1))
        };
        let outcome = executor(Duration::from_millis(30))
            .replay(SyncDomain::Budget, &mut session, &record(SyncOperation::Update))
            .await;

        match outcome {
            ReplayOutcome::Retryable {
                reason,
                session_lost,
            } => {
                assert!(session_lost);
                assert!(reason.contains("timed out"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_operation_is_retained() {
        let mut session = session(Ok(1));
        let outcome = executor(Duration::from_secs(1))
            .replay(
                SyncDomain::Budget,
                &mut session,
                &record(SyncOperation::UpdateEmail),
            )
            .await;

        assert!(!outcome.is_success());
        assert!(session.seen.is_empty());
    }
}
