//! QuickBooks connection, sync trigger and webhook routes.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use backoffice_core::{AuthorizationRequest, WebhookOutcome};
use backoffice_domain::constants::WEBHOOK_SIGNATURE_HEADER;
use backoffice_domain::{BackofficeError, Cliente, ConnectionStatus, SyncEntity, TokenGrant};
use serde::Deserialize;

use crate::caller::Caller;
use crate::context::AppContext;
use crate::error::ApiResult;
use crate::extract::{optional_json, ApiJson, ApiQuery};
use crate::utils::execute;

type Ctx = State<Arc<AppContext>>;

pub fn router() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/api/quickbooks/connect", get(connect))
        .route("/api/quickbooks/callback", get(callback))
        .route("/api/quickbooks/disconnect", post(disconnect))
        .route("/api/quickbooks/token", get(token_status).put(store_token))
        .route("/api/quickbooks/sync", post(trigger_sync))
        .route("/api/quickbooks/webhook", post(webhook))
        .route("/api/clientes/{id}/push", post(push_cliente))
}

async fn connect(State(ctx): Ctx, caller: Caller) -> ApiResult<Json<AuthorizationRequest>> {
    caller.require_manager()?;
    execute("quickbooks::connect", || async { ctx.onboarding.authorization_url() })
        .await
        .map(Json)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallbackParams {
    #[serde(default)]
    code: String,
    #[serde(default)]
    realm_id: String,
    #[serde(default)]
    state: String,
}

async fn callback(
    State(ctx): Ctx,
    ApiQuery(params): ApiQuery<CallbackParams>,
) -> ApiResult<Json<ConnectionStatus>> {
    execute("quickbooks::callback", || {
        ctx.onboarding.complete_authorization(&params.code, &params.realm_id, &params.state)
    })
    .await
    .map(Json)
}

async fn disconnect(State(ctx): Ctx, caller: Caller) -> ApiResult<Json<ConnectionStatus>> {
    caller.require_manager()?;
    execute("quickbooks::disconnect", || ctx.tokens.disconnect()).await.map(Json)
}

async fn token_status(State(ctx): Ctx, _caller: Caller) -> ApiResult<Json<ConnectionStatus>> {
    execute("quickbooks::token_status", || ctx.tokens.status()).await.map(Json)
}

/// Token pair supplied by an operator.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreTokenRequest {
    realm_id: String,
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    refresh_token_expires_in: i64,
}

impl StoreTokenRequest {
    fn into_grant(self) -> (String, TokenGrant) {
        let grant = TokenGrant {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: "bearer".into(),
            expires_in: self.expires_in,
            refresh_token_expires_in: self.refresh_token_expires_in,
        };
        (self.realm_id, grant)
    }
}

async fn store_token(
    State(ctx): Ctx,
    caller: Caller,
    ApiJson(request): ApiJson<StoreTokenRequest>,
) -> ApiResult<Json<ConnectionStatus>> {
    caller.require_admin()?;
    let (realm_id, grant) = request.into_grant();
    execute("quickbooks::store_token", || ctx.tokens.store_grant(&realm_id, &grant))
        .await
        .map(Json)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncRequest {
    #[serde(default)]
    entity: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

/// What a sync request asked for.
#[derive(Debug, PartialEq, Eq)]
enum SyncTarget {
    All,
    One(SyncEntity),
}

fn parse_target(entity: Option<&str>) -> Result<SyncTarget, BackofficeError> {
    match entity.map(str::trim) {
        None | Some("") => Ok(SyncTarget::All),
        Some(name) if name.eq_ignore_ascii_case("all") => Ok(SyncTarget::All),
        Some(name) => name.parse().map(SyncTarget::One).map_err(|_| {
            BackofficeError::Validation(format!(
                "invalid entity '{name}': expected clientes, produtos, pedidos or all"
            ))
        }),
    }
}

async fn trigger_sync(
    State(ctx): Ctx,
    caller: Caller,
    body: Bytes,
) -> ApiResult<Response> {
    caller.require_manager()?;
    let request: SyncRequest = optional_json(&body)?;
    let target = parse_target(request.entity.as_deref())?;

    match target {
        SyncTarget::All => {
            let summary = execute("quickbooks::sync_all", || async {
                Ok(ctx.sync.sync_all().await)
            })
            .await?;
            Ok(Json(summary).into_response())
        }
        SyncTarget::One(entity) => {
            let summary = execute("quickbooks::sync_entity", || {
                ctx.sync.sync_entity(entity, request.id.as_deref())
            })
            .await?;
            Ok(Json(summary).into_response())
        }
    }
}

/// Authenticated by its signature, never by caller headers.
async fn webhook(
    State(ctx): Ctx,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookOutcome>> {
    let signature = headers.get(WEBHOOK_SIGNATURE_HEADER).and_then(|value| value.to_str().ok());
    execute("quickbooks::webhook", || ctx.webhooks.handle(&body, signature)).await.map(Json)
}

async fn push_cliente(
    State(ctx): Ctx,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Cliente>> {
    caller.require_manager()?;
    execute("quickbooks::push_cliente", || ctx.sync.push_cliente(&id)).await.map(Json)
}
