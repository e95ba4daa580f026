use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct ConnectionPool {
    pool: Arc<SqlitePool>,
}

impl ConnectionPool {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        ensure_parent_dir(database_url)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(database_url)
            .await?;

        info!(target: "sync::database", url = database_url, "database connected");

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Connections are opened on first acquire, so an unreachable store does
    /// not fail construction. Acquires give up after `acquire_timeout`.
    pub fn lazy(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        ensure_parent_dir(database_url)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(acquire_timeout)
            .connect_lazy(database_url)?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Each in-memory connection is its own database, so the pool is pinned to one.
    pub async fn from_memory() -> Result<Self, sqlx::Error> {
        Self::new("sqlite::memory:", 1).await
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Entity tables, shared by the local store and the sqlx remote store.
    pub async fn migrate_finance(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations/finance")
            .run(self.pool.as_ref())
            .await
    }

    pub async fn migrate_queue(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations/queue")
            .run(self.pool.as_ref())
            .await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn ensure_parent_dir(database_url: &str) -> Result<(), sqlx::Error> {
    let Some(rest) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
