//! SQLite connection pool

use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::{debug, info, instrument, warn};

use super::config::SqlitePoolConfig;
use super::connection::SqliteConnection;
use super::error::{StorageError, StorageResult};
use super::pragmas::apply_connection_pragmas;

/// r2d2 pool of SQLite connections.
#[derive(Debug, Clone)]
pub struct SqlitePool {
    pool: Pool<SqliteConnectionManager>,
    config: SqlitePoolConfig,
}

/// Snapshot returned by [`SqlitePool::health_check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolHealth {
    pub healthy: bool,
    pub connections: u32,
    pub idle_connections: u32,
    pub max_connections: u32,
    pub message: Option<String>,
}

impl SqlitePool {
    /// Open (creating if needed) the database at `path` and build the pool.
    ///
    /// One connection is checked out eagerly so a bad path fails here rather
    /// than on first use.
    #[instrument(skip(config), fields(db_path = ?path, pool_size = config.max_size))]
    pub fn new(path: &Path, config: SqlitePoolConfig) -> StorageResult<Self> {
        info!("Creating SQLite connection pool");

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let pragma_config = config.clone();
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            apply_connection_pragmas(conn, &pragma_config)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        });

        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .map_err(|e| {
                warn!("Failed to create connection pool: {}", e);
                StorageError::Connection(format!("Failed to create pool: {e}"))
            })?;

        drop(pool.get()?);
        info!("SQLite pool created with {} connections", config.max_size);

        Ok(Self { pool, config })
    }

    #[instrument(skip(self), fields(pool_size = self.config.max_size))]
    pub fn get_connection(&self) -> StorageResult<SqliteConnection> {
        let start = std::time::Instant::now();

        match self.pool.get() {
            Ok(conn) => {
                debug!("Connection acquired in {}ms", start.elapsed().as_millis());
                Ok(SqliteConnection::new(conn))
            }
            Err(e) if e.to_string().to_lowercase().contains("timed out") => {
                warn!("Connection timeout after {:?}", self.config.connection_timeout);
                Err(StorageError::Timeout(self.config.connection_timeout.as_secs()))
            }
            Err(e) => {
                warn!("Connection error: {}", e);
                Err(StorageError::Connection(format!("Failed to get connection: {e}")))
            }
        }
    }

    pub fn health_check(&self) -> PoolHealth {
        let state = self.pool.state();
        let check = self.pool.get().map_err(StorageError::from).and_then(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).map_err(StorageError::from)
        });

        PoolHealth {
            healthy: check.is_ok(),
            connections: state.connections,
            idle_connections: state.idle_connections,
            max_connections: self.config.max_size,
            message: check.err().map(|e| e.to_string()),
        }
    }

    pub fn config(&self) -> &SqlitePoolConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested/dir/backoffice.db");

        let pool = SqlitePool::new(&db_path, SqlitePoolConfig::default()).unwrap();
        assert!(db_path.exists());
        assert!(pool.health_check().healthy);
    }

    #[test]
    fn concurrent_writers_share_the_pool() {
        let temp_dir = TempDir::new().unwrap();
        let pool = Arc::new(
            SqlitePool::new(&temp_dir.path().join("test.db"), SqlitePoolConfig::default())
                .unwrap(),
        );
        pool.get_connection()
            .unwrap()
            .execute("CREATE TABLE test (id INTEGER PRIMARY KEY, value TEXT)", [])
            .unwrap();

        let handles: Vec<_> = (0..5)
            .map(|i| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    let conn = pool.get_connection().unwrap();
                    conn.execute("INSERT INTO test (value) VALUES (?1)", [format!("t{i}")])
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let conn = pool.get_connection().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM test", [], |row| row.get(0)).unwrap();
        assert_eq!(count, 5);
    }
}
