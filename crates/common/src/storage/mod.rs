//! SQLite storage primitives
//!
//! An r2d2 pool of rusqlite connections with per-connection pragmas applied
//! on checkout. Schema ownership stays with the application.

pub mod config;
pub mod connection;
pub mod error;
pub mod pool;
pub mod pragmas;

pub use config::SqlitePoolConfig;
pub use connection::{SqliteConnection, SqliteStatement};
pub use error::{StorageError, StorageResult};
pub use pool::{PoolHealth, SqlitePool};
pub use pragmas::apply_connection_pragmas;
