use crate::application::ports::{RemoteConnector, RemoteSession, RemoteWrite};
use crate::domain::registry::WriteProcedure;
use crate::infrastructure::database::statements;
use crate::infrastructure::database::ConnectionPool;
use crate::shared::error::RemoteError;
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{Connection, Sqlite};

/// Remote store reached through a sqlx pool. One pooled connection per session,
/// one transaction per write.
#[derive(Clone)]
pub struct SqlxRemoteConnector {
    pool: ConnectionPool,
}

impl SqlxRemoteConnector {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemoteConnector for SqlxRemoteConnector {
    async fn acquire(&self) -> Result<Box<dyn RemoteSession>, RemoteError> {
        let conn = self.pool.get_pool().acquire().await?;
        Ok(Box::new(SqlxRemoteSession { conn }))
    }
}

pub struct SqlxRemoteSession {
    conn: PoolConnection<Sqlite>,
}

#[async_trait]
impl RemoteSession for SqlxRemoteSession {
    async fn commit_write(&mut self, write: RemoteWrite<'_>) -> Result<u64, RemoteError> {
        let statement = match write.procedure {
            WriteProcedure::InsertRow => {
                statements::remote_upsert(write.table, write.local_id, write.owner_id, write.payload)
            }
            procedure => statements::keyed_write(
                write.table,
                procedure,
                write.local_id,
                Some(write.owner_id),
                write.payload,
            )
            .ok_or_else(|| {
                RemoteError::Rejected(format!(
                    "payload has no columns for {:?} on {}",
                    procedure, write.table.table
                ))
            })?,
        };

        // Dropping this future before commit rolls the transaction back.
        let mut tx = self.conn.begin().await?;
        let result = statement.query().execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }

    async fn close(self: Box<Self>) {
        drop(self.conn);
    }
}
