use crate::application::ports::QueueStore;
use crate::domain::entities::PendingSyncRecord;
use crate::domain::value_objects::{SyncDomain, SyncRecordId};
use crate::shared::error::SyncError;
use crate::shared::keyed_locks::KeyedLocks;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error};

/// One pretty-printed JSON array per domain, `pending_<domain>_sync.json`.
///
/// Every change rewrites the whole file through a synced temp file and a
/// rename, so a crash leaves either the old or the new queue on disk.
pub struct JsonFileQueueStore {
    dir: PathBuf,
    locks: KeyedLocks<SyncDomain>,
}

impl JsonFileQueueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: KeyedLocks::new(),
        }
    }

    pub fn path_for(&self, domain: SyncDomain) -> PathBuf {
        self.dir
            .join(format!("pending_{}_sync.json", domain.as_str()))
    }

    async fn read_records(path: &Path) -> Result<Vec<PendingSyncRecord>, SyncError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_records(
        &self,
        path: &Path,
        records: &[PendingSyncRecord],
    ) -> Result<(), SyncError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let body = serde_json::to_vec_pretty(records)?;
        let tmp = path.with_extension("json.tmp");

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&body).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl QueueStore for JsonFileQueueStore {
    async fn append(
        &self,
        domain: SyncDomain,
        record: &PendingSyncRecord,
    ) -> Result<(), SyncError> {
        if record.domain != domain {
            return Err(SyncError::QueueAppendFailed(format!(
                "record for {} cannot be queued under {domain}",
                record.domain
            )));
        }

        let path = self.path_for(domain);
        let _guard = self.locks.lock(domain).await;

        let result = async {
            let mut records = Self::read_records(&path).await?;
            records.push(record.clone());
            self.write_records(&path, &records).await
        }
        .await;

        result.map_err(|err| {
            error!(
                target: "sync::queue",
                domain = %domain,
                path = %path.display(),
                error = %err,
                "failed to persist pending record"
            );
            SyncError::QueueAppendFailed(err.to_string())
        })?;

        debug!(
            target: "sync::queue",
            domain = %domain,
            record_id = %record.record_id,
            "pending record appended"
        );
        Ok(())
    }

    async fn load(&self, domain: SyncDomain) -> Result<Vec<PendingSyncRecord>, SyncError> {
        let path = self.path_for(domain);
        let _guard = self.locks.lock(domain).await;
        Self::read_records(&path).await
    }

    async fn remove(
        &self,
        domain: SyncDomain,
        record_ids: &[SyncRecordId],
    ) -> Result<usize, SyncError> {
        if record_ids.is_empty() {
            return Ok(0);
        }

        let path = self.path_for(domain);
        let _guard = self.locks.lock(domain).await;

        let mut records = Self::read_records(&path).await?;
        let before = records.len();
        records.retain(|record| !record_ids.contains(&record.record_id));
        let removed = before - records.len();

        if removed > 0 {
            self.write_records(&path, &records).await?;
            debug!(target: "sync::queue", domain = %domain, removed, "pending records removed");
        }
        Ok(removed)
    }
}
