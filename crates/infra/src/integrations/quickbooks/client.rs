//! Company-scoped REST client for the QuickBooks Online accounting API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backoffice_core::{AccessTokenProvider, ActiveCredential, QuickBooksTransport};
use backoffice_domain::{BackofficeError, QuickBooksConfig, RemoteFault, Result};
use reqwest::header::ACCEPT;
use reqwest::{Method, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::errors::InfraError;
use crate::http::HttpClient;

const JSON: &str = "application/json";
const PDF: &str = "application/pdf";

/// Provider fault code for a write carrying an outdated `SyncToken`.
const STALE_OBJECT_CODE: &str = "5010";
/// Provider fault code for an id that does not exist.
const OBJECT_NOT_FOUND_CODE: &str = "610";

/// [`QuickBooksTransport`] over HTTPS with bearer auth.
///
/// A 401 triggers exactly one forced token refresh and one replay.
pub struct QuickBooksClient {
    http: HttpClient,
    base_url: String,
    minor_version: u32,
    tokens: Arc<dyn AccessTokenProvider>,
}

struct Outgoing<'a> {
    method: Method,
    path: &'a str,
    params: &'a [(&'a str, &'a str)],
    body: Option<&'a Value>,
    accept: &'static str,
}

impl QuickBooksClient {
    pub fn new(
        http: HttpClient,
        base_url: impl Into<String>,
        minor_version: u32,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url, minor_version, tokens }
    }

    pub fn from_config(
        config: &QuickBooksConfig,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .user_agent(concat!("backoffice/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::new(http, config.api_base(), config.minor_version, tokens))
    }

    fn company_url(&self, realm_id: &str, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let raw = format!(
            "{}/v3/company/{}/{}",
            self.base_url,
            realm_id,
            path.trim_start_matches('/')
        );
        let mut url = Url::parse(&raw)
            .map_err(|e| BackofficeError::Config(format!("invalid QuickBooks URL {raw}: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("minorversion", &self.minor_version.to_string());
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn send_once(
        &self,
        credential: &ActiveCredential,
        request: &Outgoing<'_>,
    ) -> Result<Response> {
        let url = self.company_url(&credential.realm_id, request.path, request.params)?;
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .bearer_auth(&credential.access_token)
            .header(ACCEPT, request.accept);
        if let Some(body) = request.body {
            builder = builder.json(body);
        }
        self.http.send(builder).await
    }

    async fn execute(&self, request: Outgoing<'_>) -> Result<Response> {
        let credential = self.tokens.access_token().await?;
        let response = self.send_once(&credential, &request).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response).await;
        }

        warn!(
            realm_id = %credential.realm_id,
            path = request.path,
            "QuickBooks rejected the access token, forcing a refresh"
        );
        let refreshed = self.tokens.force_refresh(&credential.access_token).await?;
        let response = self.send_once(&refreshed, &request).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(BackofficeError::Auth(
                "QuickBooks rejected the access token after a refresh".into(),
            ));
        }
        check_status(response).await
    }

    async fn execute_json(&self, request: Outgoing<'_>) -> Result<Value> {
        let response = self.execute(request).await?;
        let text = response.text().await.map_err(|e| BackofficeError::from(InfraError::from(e)))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| BackofficeError::Internal(format!("invalid QuickBooks response: {e}")))
    }
}

/// Pass 2xx through; turn anything else into a classified domain error.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let intuit_tid = response
        .headers()
        .get("intuit_tid")
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned);
    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
    let error = classify_fault(status.as_u16(), body);
    debug!(
        status = status.as_u16(),
        intuit_tid = ?intuit_tid,
        kind = error.kind(),
        "QuickBooks fault"
    );
    Err(error)
}

/// Map a non-2xx answer (other than 401) onto the error taxonomy.
pub(crate) fn classify_fault(status: u16, body: Value) -> BackofficeError {
    let fault = RemoteFault::new(status, body);
    let codes = fault.codes();

    let stale = codes.iter().any(|code| code == STALE_OBJECT_CODE)
        || fault.messages().iter().any(|message| message.to_lowercase().contains("stale"));
    if stale {
        return BackofficeError::Conflict(fault.summary());
    }
    if status == StatusCode::NOT_FOUND.as_u16()
        || codes.iter().any(|code| code == OBJECT_NOT_FOUND_CODE)
    {
        return BackofficeError::NotFound(fault.summary());
    }
    BackofficeError::Remote(fault)
}

#[async_trait]
impl QuickBooksTransport for QuickBooksClient {
    #[instrument(skip(self, params))]
    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.execute_json(Outgoing { method: Method::GET, path, params, body: None, accept: JSON })
            .await
    }

    #[instrument(skip(self, params, body))]
    async fn post(&self, path: &str, params: &[(&str, &str)], body: &Value) -> Result<Value> {
        let body = (!body.is_null()).then_some(body);
        self.execute_json(Outgoing { method: Method::POST, path, params, body, accept: JSON })
            .await
    }

    #[instrument(skip(self))]
    async fn query(&self, statement: &str) -> Result<Value> {
        let params = [("query", statement)];
        self.execute_json(Outgoing {
            method: Method::GET,
            path: "query",
            params: &params,
            body: None,
            accept: JSON,
        })
        .await
    }

    #[instrument(skip(self))]
    async fn get_pdf(&self, path: &str) -> Result<Vec<u8>> {
        let response = self
            .execute(Outgoing { method: Method::GET, path, params: &[], body: None, accept: PDF })
            .await?;
        let bytes =
            response.bytes().await.map_err(|e| BackofficeError::from(InfraError::from(e)))?;
        Ok(bytes.to_vec())
    }
}
