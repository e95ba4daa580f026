use super::connection_pool::ConnectionPool;
use super::row_mapper::row_to_payload;
use super::statements;
use crate::application::ports::LocalStore;
use crate::domain::registry::{TableSpec, WriteProcedure};
use crate::domain::value_objects::{LocalId, OwnerId, SyncPayload};
use crate::shared::error::SyncError;
use async_trait::async_trait;

pub struct SqliteLocalStore {
    pool: ConnectionPool,
}

impl SqliteLocalStore {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }
}

fn local_failure(err: sqlx::Error) -> SyncError {
    SyncError::LocalWriteFailed(err.to_string())
}

#[async_trait]
impl LocalStore for SqliteLocalStore {
    async fn insert(
        &self,
        table: &TableSpec,
        owner_id: Option<OwnerId>,
        payload: &SyncPayload,
    ) -> Result<LocalId, SyncError> {
        let statement = statements::local_insert(table, owner_id, payload);
        let result = statement
            .query()
            .execute(self.pool.get_pool())
            .await
            .map_err(local_failure)?;

        LocalId::new(result.last_insert_rowid()).map_err(SyncError::LocalWriteFailed)
    }

    async fn write(
        &self,
        table: &TableSpec,
        procedure: WriteProcedure,
        local_id: LocalId,
        owner_id: Option<OwnerId>,
        payload: &SyncPayload,
    ) -> Result<u64, SyncError> {
        let statement = statements::keyed_write(table, procedure, local_id, owner_id, payload)
            .ok_or_else(|| {
                SyncError::LocalWriteFailed(format!(
                    "{:?} cannot be applied to an existing {} row",
                    procedure, table.table
                ))
            })?;

        let result = statement
            .query()
            .execute(self.pool.get_pool())
            .await
            .map_err(local_failure)?;

        Ok(result.rows_affected())
    }

    async fn fetch_row(
        &self,
        table: &TableSpec,
        local_id: LocalId,
    ) -> Result<Option<SyncPayload>, SyncError> {
        let row = sqlx::query(&statements::select_row(table))
            .bind(local_id.value())
            .fetch_optional(self.pool.get_pool())
            .await?;

        let mut excluded = vec![table.id_column];
        if let Some(owner_column) = table.owner_column {
            excluded.push(owner_column);
        }

        row.map(|row| row_to_payload(&row, &excluded))
            .transpose()
            .map_err(SyncError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::registry::DomainRegistry;
    use crate::domain::value_objects::{SyncDomain, SyncOperation};
    use serde_json::json;

    async fn store() -> SqliteLocalStore {
        let pool = ConnectionPool::from_memory().await.unwrap();
        pool.migrate_finance().await.unwrap();
        SqliteLocalStore::new(pool)
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_read_back_carries_defaults() {
        let store = store().await;
        let registry = DomainRegistry::standard();
        let table = &registry.spec(SyncDomain::Account).unwrap().table;
        let owner = Some(OwnerId::new(1).unwrap());
        let payload = SyncPayload::new(json!({"nickname": "savings"})).unwrap();

        let first = store.insert(table, owner, &payload).await.unwrap();
        let second = store.insert(table, owner, &payload).await.unwrap();
        assert!(second.value() > first.value());

        let row = store.fetch_row(table, first).await.unwrap().unwrap();
        assert_eq!(row.get("is_active"), Some(&json!("Y")));
        assert_eq!(row.get("balance").and_then(|v| v.as_f64()), Some(0.0));
        assert!(!row.contains_key("account_id"));
        assert!(!row.contains_key("user_id"));
    }

    #[tokio::test]
    async fn writes_are_scoped_to_the_owner() {
        let store = store().await;
        let registry = DomainRegistry::standard();
        let (spec, procedure) = registry
            .lookup(SyncDomain::Transaction, SyncOperation::SoftDelete)
            .unwrap();
        let owner = Some(OwnerId::new(1).unwrap());
        let stranger = Some(OwnerId::new(2).unwrap());

        let id = store
            .insert(&spec.table, owner, &SyncPayload::new(json!({"amount": 12.5})).unwrap())
            .await
            .unwrap();
        let flag = spec.prepare_payload(procedure, SyncPayload::empty()).unwrap();

        let rows = store
            .write(&spec.table, procedure, id, stranger, &flag)
            .await
            .unwrap();
        assert_eq!(rows, 0);

        let rows = store
            .write(&spec.table, procedure, id, owner, &flag)
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let row = store.fetch_row(&spec.table, id).await.unwrap().unwrap();
        assert_eq!(row.get("is_deleted"), Some(&json!("Y")));
    }

    #[tokio::test]
    async fn missing_row_reads_back_as_none() {
        let store = store().await;
        let registry = DomainRegistry::standard();
        let table = &registry.spec(SyncDomain::Note).unwrap().table;

        let row = store
            .fetch_row(table, LocalId::new(404).unwrap())
            .await
            .unwrap();
        assert!(row.is_none());
    }
}
