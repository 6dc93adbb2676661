//! QuickBooks to local reconciliation and the sync audit log.

pub mod journal;
pub mod manager;
pub(crate) mod mapping;
pub mod ports;

pub use journal::SyncJournal;
pub use manager::SyncManager;
pub use ports::SyncLogRepository;
