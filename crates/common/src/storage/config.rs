//! Pool configuration

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SqlitePoolConfig {
    /// Maximum number of connections in the pool
    pub max_size: u32,

    /// How long a checkout waits for a free connection
    pub connection_timeout: Duration,

    /// Busy timeout for SQLite lock contention
    pub busy_timeout: Duration,

    pub enable_wal: bool,

    pub enable_foreign_keys: bool,
}

impl SqlitePoolConfig {
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }
}

impl Default for SqlitePoolConfig {
    fn default() -> Self {
        Self {
            max_size: 8,
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_millis(5000),
            enable_wal: true,
            enable_foreign_keys: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SqlitePoolConfig::default();
        assert_eq!(config.max_size, 8);
        assert_eq!(config.busy_timeout, Duration::from_millis(5000));
        assert!(config.enable_wal);
        assert!(config.enable_foreign_keys);
        assert_eq!(config.with_max_size(2).max_size, 2);
    }
}
