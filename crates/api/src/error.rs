//! Domain errors as HTTP responses.
//!
//! Every error body is `{"error": "<message>"}`. A QuickBooks fault also
//! carries the provider payload under `"fault"`. A caller without the
//! required role gets 403.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use backoffice_domain::BackofficeError;
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug)]
pub enum ApiError {
    Domain(BackofficeError),
    Forbidden(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<BackofficeError> for ApiError {
    fn from(err: BackofficeError) -> Self {
        Self::Domain(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        let err = match self {
            Self::Domain(err) => err,
            Self::Forbidden(_) => return StatusCode::FORBIDDEN,
        };
        match err {
            BackofficeError::Validation(_) => StatusCode::BAD_REQUEST,
            BackofficeError::Auth(_) => StatusCode::UNAUTHORIZED,
            BackofficeError::NotFound(_) => StatusCode::NOT_FOUND,
            BackofficeError::Conflict(_) => StatusCode::CONFLICT,
            BackofficeError::Integrity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BackofficeError::Remote(_) => StatusCode::BAD_GATEWAY,
            BackofficeError::Database(_)
            | BackofficeError::Config(_)
            | BackofficeError::Network(_)
            | BackofficeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the caller, without the variant prefix.
    pub fn message(&self) -> String {
        let err = match self {
            Self::Domain(err) => err,
            Self::Forbidden(msg) => return msg.clone(),
        };
        match err {
            BackofficeError::Validation(msg)
            | BackofficeError::Auth(msg)
            | BackofficeError::Conflict(msg)
            | BackofficeError::NotFound(msg)
            | BackofficeError::Integrity(msg)
            | BackofficeError::Database(msg)
            | BackofficeError::Config(msg)
            | BackofficeError::Network(msg)
            | BackofficeError::Internal(msg) => msg.clone(),
            BackofficeError::Remote(fault) => fault.summary(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        let kind = match &self {
            Self::Domain(err) => err.kind(),
            Self::Forbidden(_) => "forbidden",
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), kind, error = %message, "request failed");
        } else {
            warn!(status = status.as_u16(), kind, error = %message, "request rejected");
        }

        let body = match self {
            Self::Domain(BackofficeError::Remote(fault)) => {
                json!({ "error": message, "fault": fault.body })
            }
            _ => json!({ "error": message }),
        };
        (status, Json(body)).into_response()
    }
}
