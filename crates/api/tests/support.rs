//! Router harness: a temporary SQLite file plus a mock QuickBooks host.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use backoffice_api::{build_router, AppContext};
use backoffice_domain::{
    Config, DatabaseConfig, QuickBooksConfig, QuickBooksEnvironment, ServerConfig, TokenGrant,
};
use backoffice_infra::HmacWebhookVerifier;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::MockServer;

pub const REALM_ID: &str = "9130";
pub const ACCESS_TOKEN: &str = "access-token-1";
pub const WEBHOOK_TOKEN: &str = "verifier-token";

pub struct TestApp {
    pub ctx: Arc<AppContext>,
    pub router: Router,
    pub quickbooks: MockServer,
    _temp_dir: TempDir,
}

impl TestApp {
    /// Fresh database, no QuickBooks connection.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let quickbooks = MockServer::start().await;

        let config = Config {
            database: DatabaseConfig {
                path: temp_dir.path().join("backoffice.db").display().to_string(),
                pool_size: 4,
            },
            quickbooks: QuickBooksConfig {
                client_id: "client-id".into(),
                client_secret: "client-secret".into(),
                redirect_uri: "http://localhost:8080/api/quickbooks/callback".into(),
                environment: QuickBooksEnvironment::Sandbox,
                webhook_verifier_token: Some(WEBHOOK_TOKEN.into()),
                minor_version: 75,
                api_base_url: Some(quickbooks.uri()),
                token_url: Some(format!("{}/oauth2/v1/tokens/bearer", quickbooks.uri())),
                request_timeout_secs: 5,
                refresh_margin_secs: 300,
            },
            server: ServerConfig::default(),
        };

        let ctx = Arc::new(AppContext::new(config).expect("failed to build context"));
        let router = build_router(Arc::clone(&ctx));

        Self { ctx, router, quickbooks, _temp_dir: temp_dir }
    }

    /// Fresh database with an active, unexpired connection for [`REALM_ID`].
    pub async fn connected() -> Self {
        let app = Self::new().await;
        let grant = TokenGrant {
            access_token: ACCESS_TOKEN.into(),
            refresh_token: "refresh-token-1".into(),
            token_type: "bearer".into(),
            expires_in: 3600,
            refresh_token_expires_in: 8_726_400,
        };
        app.ctx.tokens.store_grant(REALM_ID, &grant).await.expect("failed to seed connection");
        app
    }

    pub fn qbo_path(&self, resource: &str) -> String {
        format!("/v3/company/{REALM_ID}/{resource}")
    }

    pub fn sign(&self, body: &[u8]) -> String {
        HmacWebhookVerifier::new(WEBHOOK_TOKEN).sign(body).expect("failed to sign body")
    }

    /// Send a request as `role`; `None` sends no identity headers.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        role: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(role) = role {
            builder = builder.header("x-user-id", "user-1").header("x-user-role", role);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).expect("failed to build request")).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response =
            self.router.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("failed to read body");

        TestResponse { status, content_type, bytes: bytes.to_vec() }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or_else(|e| {
            panic!("body is not JSON ({e}): {}", String::from_utf8_lossy(&self.bytes))
        })
    }
}
