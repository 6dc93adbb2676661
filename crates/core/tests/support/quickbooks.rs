//! Scripted QuickBooks collaborators with call recording.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use backoffice_core::{
    OAuthTokenEndpoint, QuickBooksGateway, QuickBooksTransport, WebhookSignatureVerifier,
};
use backoffice_domain::{BackofficeError, Result, TokenGrant};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Notify;

/// One request seen by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    /// Resource path, or the full statement for queries.
    pub path: String,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Answers are scripted per `(method, key)`. For queries the key is the
/// entity after `FROM`. Scripted answers are consumed in order; the last
/// one repeats. Unscripted calls fail with `Internal`.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<HashMap<(String, String), Vec<Result<Value>>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: &str, key: &str, answer: Result<Value>) -> &Self {
        self.script
            .lock()
            .entry((method.to_string(), key.to_string()))
            .or_default()
            .push(answer);
        self
    }

    pub fn on_query(&self, entity: &str, rows: Value) -> &Self {
        self.on("QUERY", entity, Ok(json!({ "QueryResponse": { entity: rows } })))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, method: &str, path: &str) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.method == method && c.path == path).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn answer(&self, method: &'static str, key: &str) -> Result<Value> {
        let mut script = self.script.lock();
        match script.get_mut(&(method.to_string(), key.to_string())) {
            Some(answers) if answers.len() > 1 => answers.remove(0),
            Some(answers) if !answers.is_empty() => answers[0].clone(),
            _ => Err(BackofficeError::Internal(format!("unscripted {method} {key}"))),
        }
    }

    fn record(
        &self,
        method: &'static str,
        path: &str,
        params: &[(&str, &str)],
        body: Option<&Value>,
    ) {
        self.calls.lock().push(RecordedCall {
            method,
            path: path.to_string(),
            params: params.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            body: body.cloned(),
        });
    }
}

#[async_trait]
impl QuickBooksTransport for MockTransport {
    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.record("GET", path, params, None);
        self.answer("GET", path)
    }

    async fn post(&self, path: &str, params: &[(&str, &str)], body: &Value) -> Result<Value> {
        self.record("POST", path, params, Some(body));
        self.answer("POST", path)
    }

    async fn query(&self, statement: &str) -> Result<Value> {
        self.record("QUERY", statement, &[], None);
        let entity = statement
            .split_whitespace()
            .skip_while(|word| *word != "FROM")
            .nth(1)
            .unwrap_or_default()
            .to_string();
        self.answer("QUERY", &entity)
    }

    async fn get_pdf(&self, path: &str) -> Result<Vec<u8>> {
        self.record("PDF", path, &[], None);
        self.answer("PDF", path).map(|value| value.as_str().unwrap_or_default().as_bytes().to_vec())
    }
}

pub fn gateway(transport: &Arc<MockTransport>) -> Arc<QuickBooksGateway> {
    Arc::new(QuickBooksGateway::new(transport.clone()))
}

/// Token endpoint returning numbered grants (`access-1`, `access-2`, ...).
#[derive(Default)]
pub struct MockTokenEndpoint {
    refreshes: AtomicUsize,
    exchanges: Mutex<Vec<(String, Option<String>)>>,
    reject: Mutex<Option<BackofficeError>>,
    gate: Mutex<Option<Arc<Notify>>>,
    refresh_started: Notify,
}

impl MockTokenEndpoint {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rejecting(error: BackofficeError) -> Arc<Self> {
        let endpoint = Self::default();
        *endpoint.reject.lock() = Some(error);
        Arc::new(endpoint)
    }

    /// Refreshes park until [`MockTokenEndpoint::release_refresh`].
    pub fn held() -> Arc<Self> {
        let endpoint = Self::default();
        *endpoint.gate.lock() = Some(Arc::new(Notify::new()));
        Arc::new(endpoint)
    }

    /// Resolves once a refresh has reached the endpoint.
    pub async fn refresh_started(&self) {
        self.refresh_started.notified().await;
    }

    pub fn release_refresh(&self) {
        if let Some(gate) = self.gate.lock().as_ref() {
            gate.notify_one();
        }
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn exchanges(&self) -> Vec<(String, Option<String>)> {
        self.exchanges.lock().clone()
    }
}

pub fn grant(n: usize) -> TokenGrant {
    TokenGrant {
        access_token: format!("access-{n}"),
        refresh_token: format!("refresh-{n}"),
        token_type: "bearer".into(),
        expires_in: 3600,
        refresh_token_expires_in: 8_726_400,
    }
}

#[async_trait]
impl OAuthTokenEndpoint for MockTokenEndpoint {
    async fn exchange_code(&self, code: &str, code_verifier: Option<&str>) -> Result<TokenGrant> {
        self.exchanges.lock().push((code.to_string(), code_verifier.map(ToOwned::to_owned)));
        let rejection = self.reject.lock().clone();
        match rejection {
            Some(err) => Err(err),
            None => Ok(grant(0)),
        }
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenGrant> {
        let n = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        let rejection = self.reject.lock().clone();
        if let Some(err) = rejection {
            return Err(err);
        }
        self.refresh_started.notify_one();
        let gate = self.gate.lock().clone();
        match gate {
            Some(gate) => gate.notified().await,
            None => tokio::task::yield_now().await,
        }
        Ok(grant(n))
    }
}

/// Accepts exactly one signature.
pub struct FixedSignature(pub &'static str);

impl WebhookSignatureVerifier for FixedSignature {
    fn verify(&self, _body: &[u8], signature: &str) -> bool {
        signature == self.0
    }
}
