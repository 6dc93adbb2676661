//! Shared reqwest client with bounded timeouts and transient-failure retry.
//!
//! Idempotent methods are retried on connect/timeout errors and 5xx answers.
//! Other methods (POST) are retried only when the connection was never made,
//! since a 5xx or a timeout may arrive after the write was committed. A 4xx
//! answer is handed back to the caller on the first attempt.

use std::time::Duration;

use backoffice_domain::constants::{DEFAULT_HTTP_MAX_ATTEMPTS, DEFAULT_HTTP_TIMEOUT_SECS};
use backoffice_domain::BackofficeError;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::{debug, warn};

use crate::errors::InfraError;

/// HTTP client with built-in retry and timeout support.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn new() -> Result<Self, BackofficeError> {
        Self::builder().build()
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the request, retrying transient failures with exponential
    /// backoff. The body must be cloneable (JSON or form bodies are).
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, BackofficeError> {
        let attempts = self.max_attempts.max(1);

        for attempt in 1..=attempts {
            let request = builder
                .try_clone()
                .ok_or_else(|| {
                    BackofficeError::Internal("streaming request bodies cannot be retried".into())
                })?
                .build()
                .map_err(|err| BackofficeError::from(InfraError::from(err)))?;

            let method = request.method().clone();
            let idempotent = is_idempotent(&method);
            let url = redacted_url(request.url());
            debug!(attempt, %method, %url, "sending HTTP request");

            let last_attempt = attempt == attempts;
            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt, %method, %url, %status, "received HTTP response");

                    if status.is_server_error() && idempotent && !last_attempt {
                        warn!(attempt, %method, %url, %status, "server error, retrying");
                        self.sleep_with_backoff(attempt).await;
                        continue;
                    }

                    return Ok(response);
                }
                Err(err) if !last_attempt && should_retry_error(&err, idempotent) => {
                    warn!(attempt, %method, %url, error = %err, "transient HTTP failure, retrying");
                    self.sleep_with_backoff(attempt).await;
                }
                Err(err) => return Err(BackofficeError::from(InfraError::from(err))),
            }
        }

        Err(BackofficeError::Internal("http client exhausted retries without a response".into()))
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = u32::try_from(retry_number.saturating_sub(1).min(8)).unwrap_or(8);
        self.base_backoff.saturating_mul(1u32 << shift)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Query strings can carry OAuth codes; logs only get scheme, host and path.
fn redacted_url(url: &reqwest::Url) -> String {
    format!("{}://{}{}", url.scheme(), url.host_str().unwrap_or_default(), url.path())
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            max_attempts: DEFAULT_HTTP_MAX_ATTEMPTS,
            base_backoff: Duration::from_millis(200),
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, BackofficeError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(|err| BackofficeError::from(InfraError::from(err)))?;

        Ok(HttpClient { client, max_attempts: self.max_attempts, base_backoff: self.base_backoff })
    }
}

fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS
    )
}

/// A refused connection never reached the server; a timeout may have.
fn should_retry_error(err: &reqwest::Error, idempotent: bool) -> bool {
    err.is_connect() || (idempotent && err.is_timeout())
}
