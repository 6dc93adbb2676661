//! Pooled connection wrapper

use std::ops::{Deref, DerefMut};

use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection as RusqliteConnection, Params, Row, Statement as RusqliteStatement};
use tracing::instrument;

use super::error::{StorageError, StorageResult};

/// A pooled rusqlite connection, returned to the pool on drop.
///
/// Derefs to [`rusqlite::Connection`] for transactions and anything the
/// wrapper does not cover.
pub struct SqliteConnection {
    inner: PooledConnection<SqliteConnectionManager>,
}

impl SqliteConnection {
    pub fn new(conn: PooledConnection<SqliteConnectionManager>) -> Self {
        Self { inner: conn }
    }

    #[instrument(skip(self, params), fields(sql = %sql))]
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> StorageResult<usize> {
        self.inner.execute(sql, params).map_err(StorageError::from)
    }

    #[instrument(skip(self, params, f), fields(sql = %sql))]
    pub fn query_row<T, P, F>(&self, sql: &str, params: P, f: F) -> StorageResult<T>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> Result<T, rusqlite::Error>,
    {
        self.inner.query_row(sql, params, f).map_err(StorageError::from)
    }

    #[instrument(skip(self), fields(sql = %sql))]
    pub fn prepare(&self, sql: &str) -> StorageResult<SqliteStatement<'_>> {
        let stmt = self.inner.prepare(sql).map_err(StorageError::from)?;
        Ok(SqliteStatement::new(stmt))
    }
}

impl Deref for SqliteConnection {
    type Target = RusqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for SqliteConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

/// Prepared statement wrapper
pub struct SqliteStatement<'conn> {
    inner: RusqliteStatement<'conn>,
}

impl<'conn> SqliteStatement<'conn> {
    pub fn new(stmt: RusqliteStatement<'conn>) -> Self {
        Self { inner: stmt }
    }

    pub fn execute<P: Params>(&mut self, params: P) -> StorageResult<usize> {
        self.inner.execute(params).map_err(StorageError::from)
    }

    /// Run the query and collect every mapped row.
    pub fn query_map<T, P, F>(&mut self, params: P, f: F) -> StorageResult<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> Result<T, rusqlite::Error>,
    {
        let rows = self.inner.query_map(params, f).map_err(StorageError::from)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
    }
}
