#![allow(dead_code)]

use async_trait::async_trait;
use melony_sync::application::ports::{QueueStore, RemoteConnector, RemoteSession, RemoteWrite};
use melony_sync::domain::registry::WriteProcedure;
use melony_sync::infrastructure::database::{ConnectionPool, SqliteLocalStore};
use melony_sync::infrastructure::queue::{JsonFileQueueStore, SqliteQueueStore};
use melony_sync::infrastructure::remote::SqlxRemoteConnector;
use melony_sync::{
    AppConfig, DomainRegistry, LocalId, OwnerId, RemoteError, SyncEngine, SyncPayload,
};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const REMOTE_TIMEOUT: Duration = Duration::from_millis(200);
pub const SLOW_REMOTE: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteWriteLog {
    pub table: &'static str,
    pub local_id: i64,
    pub procedure: WriteProcedure,
}

#[derive(Default)]
struct RemoteSwitches {
    offline: AtomicBool,
    delay_ms: AtomicU64,
    rejected_ids: Mutex<HashSet<i64>>,
    log: Mutex<Vec<RemoteWriteLog>>,
}

/// Remote store wrapper that can be taken offline, slowed down, or told to
/// reject writes for particular ids.
pub struct FlakyRemote {
    inner: SqlxRemoteConnector,
    switches: Arc<RemoteSwitches>,
}

impl FlakyRemote {
    pub fn new(inner: SqlxRemoteConnector) -> Self {
        Self {
            inner,
            switches: Arc::new(RemoteSwitches::default()),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.switches.offline.store(!online, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.switches
            .delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn reject(&self, local_id: LocalId) {
        self.switches
            .rejected_ids
            .lock()
            .expect("rejected ids")
            .insert(local_id.value());
    }

    pub fn accept_all(&self) {
        self.switches.rejected_ids.lock().expect("rejected ids").clear();
    }

    pub fn writes(&self) -> Vec<RemoteWriteLog> {
        self.switches.log.lock().expect("write log").clone()
    }

    pub fn clear_writes(&self) {
        self.switches.log.lock().expect("write log").clear();
    }
}

#[async_trait]
impl RemoteConnector for FlakyRemote {
    async fn acquire(&self) -> Result<Box<dyn RemoteSession>, RemoteError> {
        if self.switches.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("remote store is offline".into()));
        }
        let inner = self.inner.acquire().await?;
        Ok(Box::new(FlakySession {
            inner,
            switches: Arc::clone(&self.switches),
        }))
    }
}

struct FlakySession {
    inner: Box<dyn RemoteSession>,
    switches: Arc<RemoteSwitches>,
}

#[async_trait]
impl RemoteSession for FlakySession {
    async fn commit_write(&mut self, write: RemoteWrite<'_>) -> Result<u64, RemoteError> {
        let delay = self.switches.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.switches.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("connection reset".into()));
        }
        let rejected = self
            .switches
            .rejected_ids
            .lock()
            .expect("rejected ids")
            .contains(&write.local_id.value());
        if rejected {
            return Err(RemoteError::Rejected("constraint violated".into()));
        }

        let rows = self.inner.commit_write(write).await?;
        self.switches.log.lock().expect("write log").push(RemoteWriteLog {
            table: write.table.table,
            local_id: write.local_id.value(),
            procedure: write.procedure,
        });
        Ok(rows)
    }

    async fn close(self: Box<Self>) {
        self.inner.close().await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    Sqlite,
    JsonFile,
}

pub struct TestHarness {
    pub dir: TempDir,
    pub local_pool: ConnectionPool,
    pub remote_pool: ConnectionPool,
    pub remote: Arc<FlakyRemote>,
    pub queue: Arc<dyn QueueStore>,
    pub engine: SyncEngine,
}

fn sqlite_url(dir: &TempDir, name: &str) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join(name).display())
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.remote.timeout_ms = REMOTE_TIMEOUT.as_millis() as u64;
    config.sync.auto_sync = false;
    config
}

pub async fn open_queue(dir: &TempDir, kind: QueueKind) -> Arc<dyn QueueStore> {
    match kind {
        QueueKind::Sqlite => {
            let pool = ConnectionPool::new(&sqlite_url(dir, "queue.db"), 2)
                .await
                .expect("queue db");
            pool.migrate_queue().await.expect("queue migrations");
            Arc::new(SqliteQueueStore::new(pool))
        }
        QueueKind::JsonFile => Arc::new(JsonFileQueueStore::new(dir.path().join("pending"))),
    }
}

pub async fn harness() -> TestHarness {
    harness_with(QueueKind::Sqlite, test_config()).await
}

pub async fn harness_with(kind: QueueKind, config: AppConfig) -> TestHarness {
    let dir = TempDir::new().expect("temp dir");

    let local_pool = ConnectionPool::new(&sqlite_url(&dir, "local.db"), 2)
        .await
        .expect("local db");
    local_pool.migrate_finance().await.expect("local migrations");

    let remote_pool = ConnectionPool::new(&sqlite_url(&dir, "remote.db"), 2)
        .await
        .expect("remote db");
    remote_pool.migrate_finance().await.expect("remote migrations");

    let remote = Arc::new(FlakyRemote::new(SqlxRemoteConnector::new(
        remote_pool.clone(),
    )));
    let queue = open_queue(&dir, kind).await;

    let engine = SyncEngine::from_parts(
        config,
        Arc::new(DomainRegistry::standard()),
        Arc::new(SqliteLocalStore::new(local_pool.clone())),
        remote.clone(),
        Arc::clone(&queue),
    );

    TestHarness {
        dir,
        local_pool,
        remote_pool,
        remote,
        queue,
        engine,
    }
}

pub fn payload(value: Value) -> SyncPayload {
    SyncPayload::new(value).expect("object payload")
}

pub fn owner() -> Option<OwnerId> {
    Some(OwnerId::new(1).expect("owner id"))
}

pub async fn count_rows(pool: &ConnectionPool, table: &str, id_column: &str, id: LocalId) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE {id_column} = ?");
    let (count,): (i64,) = sqlx::query_as(&sql)
        .bind(id.value())
        .fetch_one(pool.get_pool())
        .await
        .expect("count rows");
    count
}

pub async fn text_column(
    pool: &ConnectionPool,
    table: &str,
    column: &str,
    id_column: &str,
    id: LocalId,
) -> Option<String> {
    let sql = format!("SELECT {column} FROM {table} WHERE {id_column} = ?");
    sqlx::query_as::<_, (Option<String>,)>(&sql)
        .bind(id.value())
        .fetch_optional(pool.get_pool())
        .await
        .expect("select column")
        .and_then(|(value,)| value)
}
