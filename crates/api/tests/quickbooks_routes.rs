//! QuickBooks-facing routes against a mock QuickBooks host.

mod support;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value};
use support::{TestApp, ACCESS_TOKEN, REALM_ID};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

async fn mock_query(app: &TestApp, response: Value) {
    Mock::given(method("GET"))
        .and(path(app.qbo_path("query")))
        .and(header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(&app.quickbooks)
        .await;
}

fn webhook_body(entity: &str) -> Vec<u8> {
    json!({
        "eventNotifications": [{
            "realmId": REALM_ID,
            "dataChangeEvent": {"entities": [
                {"name": entity, "id": "3", "operation": "Update"}
            ]}
        }]
    })
    .to_string()
    .into_bytes()
}

fn webhook_request(body: Vec<u8>, signature: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/quickbooks/webhook")
        .header("intuit-signature", signature)
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn token_status_never_exposes_tokens() {
    let app = TestApp::connected().await;

    let response = app.request(Method::GET, "/api/quickbooks/token", Some("operator"), None).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["connected"], true);
    assert_eq!(body["realmId"], REALM_ID);
    assert_eq!(body["accessTokenValid"], true);
    assert!(!response.bytes.windows(ACCESS_TOKEN.len()).any(|w| w == ACCESS_TOKEN.as_bytes()));
}

#[tokio::test(flavor = "multi_thread")]
async fn storing_a_token_pair_requires_admin() {
    let app = TestApp::new().await;
    let body = json!({
        "realmId": "4620",
        "accessToken": "operator-at",
        "refreshToken": "operator-rt",
        "expiresIn": 3600,
        "refreshTokenExpiresIn": 8_726_400
    });

    let as_manager = app
        .request(Method::PUT, "/api/quickbooks/token", Some("manager"), Some(body.clone()))
        .await;
    let as_admin =
        app.request(Method::PUT, "/api/quickbooks/token", Some("admin"), Some(body)).await;

    assert_eq!(as_manager.status, StatusCode::FORBIDDEN);
    assert_eq!(as_admin.status, StatusCode::OK);
    assert_eq!(as_admin.json()["realmId"], "4620");
    assert_eq!(as_admin.json()["connected"], true);
}

#[tokio::test(flavor = "multi_thread")]
async fn non_positive_lifetime_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::PUT,
            "/api/quickbooks/token",
            Some("admin"),
            Some(json!({
                "realmId": "4620",
                "accessToken": "at",
                "refreshToken": "rt",
                "expiresIn": 0,
                "refreshTokenExpiresIn": 100
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn oversized_lifetime_is_rejected_and_server_keeps_running() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::PUT,
            "/api/quickbooks/token",
            Some("admin"),
            Some(json!({
                "realmId": "4620",
                "accessToken": "at",
                "refreshToken": "rt",
                "expiresIn": 10_000_000_000_000_000_i64,
                "refreshTokenExpiresIn": 8_726_400
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let status = app.request(Method::GET, "/api/quickbooks/token", Some("admin"), None).await;
    assert_eq!(status.json()["connected"], false);
}

#[tokio::test(flavor = "multi_thread")]
async fn connect_returns_authorization_url_and_callback_rejects_unknown_state() {
    let app = TestApp::new().await;

    let connect =
        app.request(Method::GET, "/api/quickbooks/connect", Some("manager"), None).await;
    assert_eq!(connect.status, StatusCode::OK);
    let body = connect.json();
    let url = body["authorizationUrl"].as_str().unwrap();
    assert!(url.starts_with("https://appcenter.intuit.com/connect/oauth2"));
    assert!(url.contains("client_id=client-id"));
    assert!(url.contains("code_challenge_method=S256"));
    assert!(!body["state"].as_str().unwrap().is_empty());

    let callback = app
        .request(
            Method::GET,
            "/api/quickbooks/callback?code=abc&realmId=9130&state=forged",
            None,
            None,
        )
        .await;
    assert_eq!(callback.status, StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn disconnect_clears_the_connection() {
    let app = TestApp::connected().await;

    let response =
        app.request(Method::POST, "/api/quickbooks/disconnect", Some("manager"), None).await;
    let status = app.request(Method::GET, "/api/quickbooks/token", Some("operator"), None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(status.json()["connected"], false);
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_produtos_creates_local_records_and_journals_the_batch() {
    let app = TestApp::connected().await;
    mock_query(
        &app,
        json!({"QueryResponse": {"Item": [
            {"Id": "3", "Name": "Areia média", "Sku": "AR-01", "UnitPrice": 80.5, "Active": true}
        ]}}),
    )
    .await;

    let response = app
        .request(
            Method::POST,
            "/api/quickbooks/sync",
            Some("manager"),
            Some(json!({"entity": "produtos"})),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let summary = response.json();
    assert_eq!(summary["entityType"], "produtos");
    assert_eq!(summary["created"], 1);

    let produtos = app.request(Method::GET, "/api/produtos", Some("operator"), None).await.json();
    assert_eq!(produtos[0]["codigo"], "AR-01");
    assert_eq!(produtos[0]["quickbooksId"], "3");
    assert_eq!(produtos[0]["syncStatus"], "synced");

    let logs = app
        .request(
            Method::GET,
            "/api/sync-logs?entityType=produtos&status=SUCCESS",
            Some("operator"),
            None,
        )
        .await;
    assert_eq!(logs.status, StatusCode::OK);
    assert_eq!(logs.json()[0]["entityType"], "produtos");
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_rejects_unknown_entity_and_operator_role() {
    let app = TestApp::connected().await;

    let unknown = app
        .request(
            Method::POST,
            "/api/quickbooks/sync",
            Some("manager"),
            Some(json!({"entity": "estimates"})),
        )
        .await;
    let operator = app.request(Method::POST, "/api/quickbooks/sync", Some("operator"), None).await;

    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
    assert_eq!(operator.status, StatusCode::FORBIDDEN);
}

#[tokio::test(flavor = "multi_thread")]
async fn webhook_with_bad_signature_is_unauthorized() {
    let app = TestApp::connected().await;

    let response = app.send(webhook_request(webhook_body("Item"), "bm90IGEgc2lnbmF0dXJl")).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test(flavor = "multi_thread")]
async fn webhook_for_estimates_is_acknowledged_without_sync() {
    let app = TestApp::connected().await;
    let body = webhook_body("Estimate");
    let signature = app.sign(&body);

    let response = app.send(webhook_request(body, &signature)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"processed": []}));
}

#[tokio::test(flavor = "multi_thread")]
async fn webhook_resyncs_the_changed_collection() {
    let app = TestApp::connected().await;
    mock_query(&app, json!({"QueryResponse": {"Item": [{"Id": "3", "Name": "Brita 1"}]}})).await;
    let body = webhook_body("Item");
    let signature = app.sign(&body);

    let response = app.send(webhook_request(body, &signature)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"processed": ["produtos"]}));
}

#[tokio::test(flavor = "multi_thread")]
async fn estimate_routes_need_a_connection() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/estimates/177", Some("operator"), None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test(flavor = "multi_thread")]
async fn get_estimate_returns_the_quickbooks_object() {
    let app = TestApp::connected().await;
    Mock::given(method("GET"))
        .and(path(app.qbo_path("estimate/177")))
        .and(query_param("minorversion", "75"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Estimate": {"Id": "177", "SyncToken": "2", "DocNumber": "1005", "TotalAmt": 250.0}
        })))
        .expect(1)
        .mount(&app.quickbooks)
        .await;

    let response = app.request(Method::GET, "/api/estimates/177", Some("operator"), None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["DocNumber"], "1005");
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_status_fails_without_calling_quickbooks() {
    let app = TestApp::connected().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.quickbooks)
        .await;

    let response = app
        .request(
            Method::PUT,
            "/api/estimates/177/status",
            Some("manager"),
            Some(json!({"status": "Approved", "syncToken": "2"})),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn pdf_is_served_with_pdf_content_type() {
    let app = TestApp::connected().await;
    Mock::given(method("GET"))
        .and(path(app.qbo_path("estimate/5/pdf")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 test".to_vec()))
        .mount(&app.quickbooks)
        .await;

    let response = app.request(Method::GET, "/api/estimates/5/pdf", Some("operator"), None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(response.bytes, b"%PDF-1.4 test");
}

#[tokio::test(flavor = "multi_thread")]
async fn quickbooks_fault_is_a_bad_gateway_with_the_fault_body() {
    let app = TestApp::connected().await;
    let fault = json!({"Fault": {"Error": [
        {"Message": "Invalid Reference Id", "Detail": "Customer 99 missing", "code": "2500"}
    ], "type": "ValidationFault"}});
    Mock::given(method("POST"))
        .and(path(app.qbo_path("estimate")))
        .respond_with(ResponseTemplate::new(400).set_body_json(&fault))
        .mount(&app.quickbooks)
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/estimates",
            Some("manager"),
            Some(json!({
                "customerId": "99",
                "lines": [{"itemId": "3", "quantity": 2.0, "unitPrice": 80.5}]
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.json()["fault"], fault);
}

async fn seed_synced_cliente(app: &TestApp) {
    mock_query(
        app,
        json!({"QueryResponse": {"Customer": [{"Id": "58", "DisplayName": "Obra Norte"}]}}),
    )
    .await;
    let response = app
        .request(
            Method::POST,
            "/api/quickbooks/sync",
            Some("manager"),
            Some(json!({"entity": "clientes"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

async fn mock_estimate_42(app: &TestApp) {
    Mock::given(method("GET"))
        .and(path(app.qbo_path("estimate/42")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Estimate": {
            "Id": "42",
            "SyncToken": "1",
            "DocNumber": "1042",
            "TxnStatus": "Accepted",
            "CustomerRef": {"value": "58"},
            "TotalAmt": 200.0,
            "Line": [{
                "Id": "1", "Amount": 200.0, "Description": "Areia média",
                "DetailType": "SalesItemLineDetail",
                "SalesItemLineDetail": {"ItemRef": {"value": "3"}, "Qty": 2, "UnitPrice": 100}
            }]
        }})))
        .mount(&app.quickbooks)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn conversion_with_unknown_driver_creates_no_invoice() {
    let app = TestApp::connected().await;
    seed_synced_cliente(&app).await;
    mock_estimate_42(&app).await;
    Mock::given(method("POST"))
        .and(path(app.qbo_path("invoice")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.quickbooks)
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/estimates/42/convert-to-invoice",
            Some("manager"),
            Some(json!({
                "motoristaId": "ghost",
                "veiculoId": "ghost",
                "dataEntrega": "2026-11-03"
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test(flavor = "multi_thread")]
async fn conversion_creates_invoice_pedido_and_entrega() {
    let app = TestApp::connected().await;
    seed_synced_cliente(&app).await;
    mock_estimate_42(&app).await;
    Mock::given(method("POST"))
        .and(path(app.qbo_path("invoice")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Invoice": {"Id": "900", "DocNumber": "2001", "TotalAmt": 200.0}
        })))
        .expect(1)
        .mount(&app.quickbooks)
        .await;
    let motorista = app
        .request(Method::POST, "/api/motoristas", Some("operator"), Some(json!({"nome": "João"})))
        .await
        .json();
    let veiculo = app
        .request(Method::POST, "/api/veiculos", Some("operator"), Some(json!({"placa": "ABC1D23"})))
        .await
        .json();

    let response = app
        .request(
            Method::POST,
            "/api/estimates/42/convert-to-invoice",
            Some("manager"),
            Some(json!({
                "motoristaId": motorista["id"],
                "veiculoId": veiculo["id"],
                "dataEntrega": "2026-11-03",
                "enderecoEntrega": "Rua das Pedras, 10"
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let result = response.json();
    assert_eq!(result["invoice"]["Id"], "900");
    assert_eq!(result["pedido"]["status"], "confirmado");
    assert_eq!(result["pedido"]["estimateId"], "42");
    assert_eq!(result["pedido"]["valorTotal"], 200.0);
    assert_eq!(result["entrega"]["pedidoId"], result["pedido"]["id"]);
    assert_eq!(result["entrega"]["enderecoEntrega"], "Rua das Pedras, 10");
    assert_eq!(result["estimateMarkedAccepted"], true);
}
