//! Conversions from external infrastructure errors into domain errors.

use backoffice_common::storage::StorageError;
use backoffice_domain::{BackofficeError, RemoteFault};
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use serde_json::Value;
use tokio::task::JoinError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub BackofficeError);

impl From<InfraError> for BackofficeError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<BackofficeError> for InfraError {
    fn from(value: BackofficeError) -> Self {
        InfraError(value)
    }
}

trait IntoBackofficeError {
    fn into_backoffice(self) -> BackofficeError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → BackofficeError */
/* -------------------------------------------------------------------------- */

impl IntoBackofficeError for SqlError {
    fn into_backoffice(self) -> BackofficeError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        BackofficeError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        BackofficeError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067 | 1555) => {
                        BackofficeError::Database(format!("unique constraint violation: {message}"))
                    }
                    (ErrorCode::ConstraintViolation, 787) => BackofficeError::Integrity(
                        "referenced record does not exist (foreign key constraint)".into(),
                    ),
                    _ => BackofficeError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => {
                BackofficeError::NotFound("no rows returned by query".into())
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                BackofficeError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                BackofficeError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => BackofficeError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => BackofficeError::Database("invalid SQL query".into()),
            other => BackofficeError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_backoffice())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → BackofficeError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(BackofficeError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → BackofficeError */
/* -------------------------------------------------------------------------- */

impl IntoBackofficeError for HttpError {
    fn into_backoffice(self) -> BackofficeError {
        if self.is_timeout() {
            return BackofficeError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return BackofficeError::Network("HTTP connection failure".into());
        }

        if self.is_decode() {
            return BackofficeError::Internal(format!("invalid response body: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => BackofficeError::Auth(message),
                404 => BackofficeError::NotFound(message),
                429 | 500..=599 => BackofficeError::Network(message),
                _ => BackofficeError::Remote(RemoteFault::new(code, Value::String(message))),
            };
        }

        BackofficeError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_backoffice())
    }
}

/* -------------------------------------------------------------------------- */
/* Helpers for repository code */
/* -------------------------------------------------------------------------- */

/// Storage-pool errors; rusqlite failures keep their precise mapping.
pub fn map_storage_error(err: StorageError) -> BackofficeError {
    match err {
        StorageError::Rusqlite(sql_err) => BackofficeError::from(InfraError::from(sql_err)),
        other => BackofficeError::Database(other.to_string()),
    }
}

/// A `spawn_blocking` task that panicked or was cancelled.
pub fn map_join_error(err: JoinError) -> BackofficeError {
    if err.is_cancelled() {
        BackofficeError::Internal("database task cancelled".into())
    } else {
        BackofficeError::Internal(format!("database task panic: {err}"))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
