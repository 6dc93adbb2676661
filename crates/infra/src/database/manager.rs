//! Database connection manager backed by the shared SQLite pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use backoffice_common::storage::{PoolHealth, SqliteConnection, SqlitePool, SqlitePoolConfig};
use backoffice_domain::{BackofficeError, Result};
use rusqlite::params;
use tokio::task;
use tracing::info;

use crate::errors::{map_join_error, map_storage_error, InfraError};

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Database manager that wraps an [`SqlitePool`] and owns the schema.
pub struct DbManager {
    pool: SqlitePool,
    path: PathBuf,
}

impl DbManager {
    /// Open the database at `db_path` with up to `pool_size` connections.
    pub fn new<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        let config = SqlitePoolConfig::default().with_max_size(pool_size.max(1));

        let pool = SqlitePool::new(&path, config).map_err(map_storage_error)?;

        info!(
            db_path = %path.display(),
            max_connections = pool.config().max_size,
            "sqlite pool initialised"
        );

        Ok(Self { pool, path })
    }

    /// Open the database and bring the schema up to date.
    pub fn open<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<Arc<Self>> {
        let manager = Self::new(db_path, pool_size)?;
        manager.run_migrations()?;
        Ok(Arc::new(manager))
    }

    pub fn get_connection(&self) -> Result<SqliteConnection> {
        self.pool.get_connection().map_err(map_storage_error)
    }

    /// Ensure the full schema exists on the current database.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(SCHEMA_SQL).map_err(map_sql_error)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at)
             VALUES (?1, CAST(strftime('%s','now') AS INTEGER))",
            params![SCHEMA_VERSION],
        )
        .map_err(map_storage_error)?;
        info!(version = SCHEMA_VERSION, "schema ready");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire a connection and run `SELECT 1`.
    pub fn health_check(&self) -> Result<PoolHealth> {
        let health = self.pool.health_check();
        if health.healthy {
            Ok(health)
        } else {
            Err(BackofficeError::Database(
                health.message.unwrap_or_else(|| "database health check failed".into()),
            ))
        }
    }
}

/// Run blocking SQL on the blocking thread pool with a pooled connection.
pub(crate) async fn blocking<T, F>(db: &Arc<DbManager>, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
{
    let db = Arc::clone(db);
    task::spawn_blocking(move || {
        let mut conn = db.get_connection()?;
        f(&mut conn)
    })
    .await
    .map_err(map_join_error)?
}

fn map_sql_error(err: rusqlite::Error) -> BackofficeError {
    BackofficeError::from(InfraError::from(err))
}
