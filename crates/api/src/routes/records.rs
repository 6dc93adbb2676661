//! Local back office records: clientes, produtos, pedidos, entregas and the
//! fleet. Reads need a caller; no role check.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use backoffice_domain::{
    Cliente, ClienteInput, Entrega, EntregaInput, EntregaUpdate, Motorista, MotoristaInput,
    Pedido, PedidoInput, PedidoUpdate, Produto, ProdutoInput, Veiculo, VeiculoInput,
};

use crate::caller::Caller;
use crate::context::AppContext;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::utils::execute;

type Ctx = State<Arc<AppContext>>;

pub fn router() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/api/clientes", get(list_clientes).post(create_cliente))
        .route(
            "/api/clientes/{id}",
            get(get_cliente).put(update_cliente).delete(delete_cliente),
        )
        .route("/api/produtos", get(list_produtos).post(create_produto))
        .route(
            "/api/produtos/{id}",
            get(get_produto).put(update_produto).delete(delete_produto),
        )
        .route("/api/pedidos", get(list_pedidos).post(create_pedido))
        .route("/api/pedidos/{id}", get(get_pedido).put(update_pedido))
        .route("/api/entregas", get(list_entregas).post(create_entrega))
        .route("/api/entregas/{id}", get(get_entrega).put(update_entrega))
        .route("/api/motoristas", get(list_motoristas).post(create_motorista))
        .route(
            "/api/motoristas/{id}",
            get(get_motorista).put(update_motorista).delete(delete_motorista),
        )
        .route("/api/veiculos", get(list_veiculos).post(create_veiculo))
        .route(
            "/api/veiculos/{id}",
            get(get_veiculo).put(update_veiculo).delete(delete_veiculo),
        )
}

// Clientes ---------------------------------------------------------------

async fn list_clientes(State(ctx): Ctx, _caller: Caller) -> ApiResult<Json<Vec<Cliente>>> {
    execute("clientes::list", || ctx.records.list_clientes()).await.map(Json)
}

async fn get_cliente(
    State(ctx): Ctx,
    _caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Cliente>> {
    execute("clientes::get", || ctx.records.get_cliente(&id)).await.map(Json)
}

async fn create_cliente(
    State(ctx): Ctx,
    _caller: Caller,
    ApiJson(input): ApiJson<ClienteInput>,
) -> ApiResult<(StatusCode, Json<Cliente>)> {
    let cliente = execute("clientes::create", || ctx.records.create_cliente(input)).await?;
    Ok((StatusCode::CREATED, Json(cliente)))
}

async fn update_cliente(
    State(ctx): Ctx,
    _caller: Caller,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ClienteInput>,
) -> ApiResult<Json<Cliente>> {
    execute("clientes::update", || ctx.records.update_cliente(&id, input)).await.map(Json)
}

async fn delete_cliente(
    State(ctx): Ctx,
    _caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    execute("clientes::delete", || ctx.records.delete_cliente(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Produtos ---------------------------------------------------------------

async fn list_produtos(State(ctx): Ctx, _caller: Caller) -> ApiResult<Json<Vec<Produto>>> {
    execute("produtos::list", || ctx.records.list_produtos()).await.map(Json)
}

async fn get_produto(
    State(ctx): Ctx,
    _caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Produto>> {
    execute("produtos::get", || ctx.records.get_produto(&id)).await.map(Json)
}

async fn create_produto(
    State(ctx): Ctx,
    _caller: Caller,
    ApiJson(input): ApiJson<ProdutoInput>,
) -> ApiResult<(StatusCode, Json<Produto>)> {
    let produto = execute("produtos::create", || ctx.records.create_produto(input)).await?;
    Ok((StatusCode::CREATED, Json(produto)))
}

async fn update_produto(
    State(ctx): Ctx,
    _caller: Caller,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ProdutoInput>,
) -> ApiResult<Json<Produto>> {
    execute("produtos::update", || ctx.records.update_produto(&id, input)).await.map(Json)
}

async fn delete_produto(
    State(ctx): Ctx,
    _caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    execute("produtos::delete", || ctx.records.delete_produto(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Pedidos ----------------------------------------------------------------

async fn list_pedidos(State(ctx): Ctx, _caller: Caller) -> ApiResult<Json<Vec<Pedido>>> {
    execute("pedidos::list", || ctx.records.list_pedidos()).await.map(Json)
}

async fn get_pedido(
    State(ctx): Ctx,
    _caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Pedido>> {
    execute("pedidos::get", || ctx.records.get_pedido(&id)).await.map(Json)
}

async fn create_pedido(
    State(ctx): Ctx,
    _caller: Caller,
    ApiJson(input): ApiJson<PedidoInput>,
) -> ApiResult<(StatusCode, Json<Pedido>)> {
    let pedido = execute("pedidos::create", || ctx.records.create_pedido(input)).await?;
    Ok((StatusCode::CREATED, Json(pedido)))
}

async fn update_pedido(
    State(ctx): Ctx,
    _caller: Caller,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<PedidoUpdate>,
) -> ApiResult<Json<Pedido>> {
    execute("pedidos::update", || ctx.records.update_pedido(&id, update)).await.map(Json)
}

// Entregas ---------------------------------------------------------------

async fn list_entregas(State(ctx): Ctx, _caller: Caller) -> ApiResult<Json<Vec<Entrega>>> {
    execute("entregas::list", || ctx.records.list_entregas()).await.map(Json)
}

async fn get_entrega(
    State(ctx): Ctx,
    _caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Entrega>> {
    execute("entregas::get", || ctx.records.get_entrega(&id)).await.map(Json)
}

async fn create_entrega(
    State(ctx): Ctx,
    _caller: Caller,
    ApiJson(input): ApiJson<EntregaInput>,
) -> ApiResult<(StatusCode, Json<Entrega>)> {
    let entrega = execute("entregas::create", || ctx.records.create_entrega(input)).await?;
    Ok((StatusCode::CREATED, Json(entrega)))
}

async fn update_entrega(
    State(ctx): Ctx,
    _caller: Caller,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<EntregaUpdate>,
) -> ApiResult<Json<Entrega>> {
    execute("entregas::update", || ctx.records.update_entrega(&id, update)).await.map(Json)
}

// Frota ------------------------------------------------------------------

async fn list_motoristas(State(ctx): Ctx, _caller: Caller) -> ApiResult<Json<Vec<Motorista>>> {
    execute("motoristas::list", || ctx.records.list_motoristas()).await.map(Json)
}

async fn get_motorista(
    State(ctx): Ctx,
    _caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Motorista>> {
    execute("motoristas::get", || ctx.records.get_motorista(&id)).await.map(Json)
}

async fn create_motorista(
    State(ctx): Ctx,
    _caller: Caller,
    ApiJson(input): ApiJson<MotoristaInput>,
) -> ApiResult<(StatusCode, Json<Motorista>)> {
    let motorista = execute("motoristas::create", || ctx.records.create_motorista(input)).await?;
    Ok((StatusCode::CREATED, Json(motorista)))
}

async fn update_motorista(
    State(ctx): Ctx,
    _caller: Caller,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<MotoristaInput>,
) -> ApiResult<Json<Motorista>> {
    execute("motoristas::update", || ctx.records.update_motorista(&id, input)).await.map(Json)
}

async fn delete_motorista(
    State(ctx): Ctx,
    _caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    execute("motoristas::delete", || ctx.records.delete_motorista(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_veiculos(State(ctx): Ctx, _caller: Caller) -> ApiResult<Json<Vec<Veiculo>>> {
    execute("veiculos::list", || ctx.records.list_veiculos()).await.map(Json)
}

async fn get_veiculo(
    State(ctx): Ctx,
    _caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Veiculo>> {
    execute("veiculos::get", || ctx.records.get_veiculo(&id)).await.map(Json)
}

async fn create_veiculo(
    State(ctx): Ctx,
    _caller: Caller,
    ApiJson(input): ApiJson<VeiculoInput>,
) -> ApiResult<(StatusCode, Json<Veiculo>)> {
    let veiculo = execute("veiculos::create", || ctx.records.create_veiculo(input)).await?;
    Ok((StatusCode::CREATED, Json(veiculo)))
}

async fn update_veiculo(
    State(ctx): Ctx,
    _caller: Caller,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<VeiculoInput>,
) -> ApiResult<Json<Veiculo>> {
    execute("veiculos::update", || ctx.records.update_veiculo(&id, input)).await.map(Json)
}

async fn delete_veiculo(
    State(ctx): Ctx,
    _caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    execute("veiculos::delete", || ctx.records.delete_veiculo(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
