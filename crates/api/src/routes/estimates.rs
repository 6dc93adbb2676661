//! QuickBooks estimate routes. Reads need a caller, mutations need a manager.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use backoffice_core::{
    ConversionResult, DeliveryDetails, EstimateFilter, EstimateForm, EstimatePatch,
};
use backoffice_domain::quickbooks::Estimate;
use serde::Deserialize;
use serde_json::Value;

use crate::caller::Caller;
use crate::context::AppContext;
use crate::error::ApiResult;
use crate::extract::{optional_json, ApiJson, ApiQuery};
use crate::utils::execute;

type Ctx = State<Arc<AppContext>>;

pub fn router() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/api/estimates", get(list_estimates).post(create_estimate))
        .route(
            "/api/estimates/{id}",
            get(get_estimate)
                .patch(patch_estimate)
                .put(replace_estimate)
                .delete(delete_estimate),
        )
        .route("/api/estimates/{id}/status", put(update_status))
        .route("/api/estimates/{id}/send", post(send_estimate))
        .route("/api/estimates/{id}/pdf", get(download_pdf))
        .route("/api/estimates/{id}/convert-to-invoice", post(convert_to_invoice))
}

async fn list_estimates(
    State(ctx): Ctx,
    _caller: Caller,
    ApiQuery(filter): ApiQuery<EstimateFilter>,
) -> ApiResult<Json<Vec<Estimate>>> {
    execute("estimates::list", || ctx.estimates.list_estimates(&filter)).await.map(Json)
}

async fn get_estimate(
    State(ctx): Ctx,
    _caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Estimate>> {
    execute("estimates::get", || ctx.estimates.get_estimate(&id)).await.map(Json)
}

async fn create_estimate(
    State(ctx): Ctx,
    caller: Caller,
    ApiJson(form): ApiJson<EstimateForm>,
) -> ApiResult<(StatusCode, Json<Estimate>)> {
    caller.require_manager()?;
    let estimate = execute("estimates::create", || ctx.estimates.create_estimate(&form)).await?;
    Ok((StatusCode::CREATED, Json(estimate)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatchRequest {
    #[serde(default)]
    sync_token: String,
    #[serde(flatten)]
    patch: EstimatePatch,
}

async fn patch_estimate(
    State(ctx): Ctx,
    caller: Caller,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<PatchRequest>,
) -> ApiResult<Json<Estimate>> {
    caller.require_manager()?;
    execute("estimates::patch", || {
        ctx.estimates.update_estimate(&id, &request.patch, &request.sync_token)
    })
    .await
    .map(Json)
}

/// The path id wins over any `Id` in the body.
async fn replace_estimate(
    State(ctx): Ctx,
    caller: Caller,
    Path(id): Path<String>,
    ApiJson(estimate): ApiJson<Estimate>,
) -> ApiResult<Json<Estimate>> {
    caller.require_manager()?;
    let estimate = Estimate { id: Some(id), ..estimate };
    execute("estimates::replace", || ctx.estimates.full_update_estimate(estimate))
        .await
        .map(Json)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusRequest {
    #[serde(default)]
    status: String,
    #[serde(default)]
    sync_token: String,
}

async fn update_status(
    State(ctx): Ctx,
    caller: Caller,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> ApiResult<Json<Estimate>> {
    caller.require_manager()?;
    execute("estimates::update_status", || {
        ctx.estimates.update_estimate_status(&id, &request.status, &request.sync_token)
    })
    .await
    .map(Json)
}

#[derive(Debug, Default, Deserialize)]
struct SendRequest {
    #[serde(default)]
    email: Option<String>,
}

async fn send_estimate(
    State(ctx): Ctx,
    caller: Caller,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Estimate>> {
    caller.require_manager()?;
    let request: SendRequest = optional_json(&body)?;
    execute("estimates::send", || ctx.estimates.send_estimate(&id, request.email.as_deref()))
        .await
        .map(Json)
}

async fn download_pdf(
    State(ctx): Ctx,
    _caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let pdf = execute("estimates::pdf", || ctx.estimates.download_pdf(&id)).await?;
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, format!("inline; filename=\"estimate-{id}.pdf\"")),
    ];
    Ok((headers, pdf))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteParams {
    #[serde(default)]
    sync_token: String,
}

async fn delete_estimate(
    State(ctx): Ctx,
    caller: Caller,
    Path(id): Path<String>,
    ApiQuery(params): ApiQuery<DeleteParams>,
) -> ApiResult<Json<Value>> {
    caller.require_manager()?;
    execute("estimates::delete", || ctx.estimates.delete_estimate(&id, &params.sync_token))
        .await
        .map(Json)
}

async fn convert_to_invoice(
    State(ctx): Ctx,
    caller: Caller,
    Path(id): Path<String>,
    ApiJson(details): ApiJson<DeliveryDetails>,
) -> ApiResult<(StatusCode, Json<ConversionResult>)> {
    caller.require_manager()?;
    let result = execute("estimates::convert_to_invoice", || {
        ctx.estimates.convert_to_invoice(&id, &details)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(result)))
}
