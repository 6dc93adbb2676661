//! `Json` and `Query` extractors whose rejections use the `{"error"}` body.

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use backoffice_domain::BackofficeError;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body; a malformed body is a validation error (400).
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            ApiError::from(BackofficeError::Validation(rejection.body_text()))
        })?;
        Ok(Self(value))
    }
}

/// Query string; a value that does not parse is a validation error (400).
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await.map_err(
            |rejection| ApiError::from(BackofficeError::Validation(rejection.body_text())),
        )?;
        Ok(Self(value))
    }
}

/// Parse a JSON body that may be left out entirely; an empty or blank body
/// yields `T::default()`.
pub fn optional_json<T>(body: &[u8]) -> Result<T, BackofficeError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| BackofficeError::Validation(format!("invalid JSON body: {e}")))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Body {
        #[serde(default)]
        email: Option<String>,
    }

    #[test]
    fn blank_body_is_default() {
        assert_eq!(optional_json::<Body>(b"").unwrap(), Body::default());
        assert_eq!(optional_json::<Body>(b" \n").unwrap(), Body::default());
    }

    #[test]
    fn present_body_is_parsed() {
        let body: Body = optional_json(br#"{"email":"a@b.pt"}"#).unwrap();
        assert_eq!(body.email.as_deref(), Some("a@b.pt"));
    }

    #[test]
    fn malformed_body_is_a_validation_error() {
        let err = optional_json::<Body>(b"{oops").unwrap_err();
        assert!(matches!(err, BackofficeError::Validation(msg) if msg.starts_with("invalid JSON")));
    }
}
