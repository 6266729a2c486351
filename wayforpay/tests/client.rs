//! Drives `WayforpayClient` against a local stand-in gateway.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use chrono::Utc;
use donate_types::{DateRange, GatewayError, PaymentGateway};
use serde_json::{Map, Value, json};
use wayforpay::{
    ClientConfig, MerchantSettings, SigningContext, WayforpayClient, build_purchase_form,
    transaction_list_query,
};

async fn pay(Form(fields): Form<Vec<(String, String)>>) -> impl IntoResponse {
    let reference = fields
        .iter()
        .find(|(k, _)| k == "orderReference")
        .map(|(_, v)| v.clone());
    let signed = fields.iter().any(|(k, _)| k == "merchantSignature");

    match (reference, signed) {
        (Some(reference), true) => {
            Redirect::to(&format!("/checkout?ref={reference}")).into_response()
        }
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn transactions(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "reason": "Ok",
        "transactionList": [
            { "merchantAccount": body["merchantAccount"], "amount": 100 }
        ]
    }))
}

async fn spawn_gateway() -> String {
    let app = Router::new()
        .route("/pay", post(pay))
        .route("/checkout", get(|| async { "checkout" }))
        .route("/api", post(transactions))
        .route("/empty", post(|| async { Json(json!({ "reason": "Ok" })) }))
        .route(
            "/broken",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base: &str, payment_path: &str, list_path: &str) -> WayforpayClient {
    WayforpayClient::new(ClientConfig {
        payment_url: format!("{base}{payment_path}"),
        transaction_list_url: format!("{base}{list_path}"),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn merchant() -> MerchantSettings {
    MerchantSettings {
        domain_name: "donate.example".into(),
        approved_url: "https://donate.example/ok".into(),
        declined_url: "https://donate.example/fail".into(),
    }
}

#[tokio::test]
async fn test_purchase_returns_final_redirect_url() {
    let base = spawn_gateway().await;
    let gateway = client(&base, "/pay", "/api");

    let mut ctx = SigningContext::new("merchant", "secret");
    let form = build_purchase_form(
        &mut ctx,
        &merchant(),
        &"Drone".into(),
        100.0,
        &Map::new(),
        Utc::now(),
    )
    .unwrap();

    let url = gateway.submit_purchase(form).await.unwrap();
    assert!(url.starts_with(&format!("{base}/checkout?ref=Drone-")), "{url}");
}

#[tokio::test]
async fn test_purchase_non_success_status_is_an_error() {
    let base = spawn_gateway().await;
    let gateway = client(&base, "/broken", "/api");

    let mut ctx = SigningContext::new("merchant", "secret");
    let form = build_purchase_form(
        &mut ctx,
        &merchant(),
        &"Drone".into(),
        100.0,
        &Map::new(),
        Utc::now(),
    )
    .unwrap();

    let result = gateway.submit_purchase(form).await;
    assert!(matches!(result, Err(GatewayError::Status(500))));
}

#[tokio::test]
async fn test_transaction_list_extracts_records() {
    let base = spawn_gateway().await;
    let gateway = client(&base, "/pay", "/api");

    let ctx = SigningContext::new("merchant", "secret");
    let query = transaction_list_query(&ctx, DateRange::new(0, 1_000).unwrap());

    let list = gateway.list_transactions(query).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["merchantAccount"], "merchant");
}

#[tokio::test]
async fn test_transaction_list_missing_field_is_empty() {
    let base = spawn_gateway().await;
    let gateway = client(&base, "/pay", "/empty");

    let ctx = SigningContext::new("merchant", "secret");
    let query = transaction_list_query(&ctx, DateRange::new(0, 1_000).unwrap());

    assert!(gateway.list_transactions(query).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_gateway_is_transport_error() {
    let gateway = client("http://127.0.0.1:9", "/pay", "/api");

    let ctx = SigningContext::new("merchant", "secret");
    let query = transaction_list_query(&ctx, DateRange::new(0, 1_000).unwrap());

    let result = gateway.list_transactions(query).await;
    assert!(matches!(result, Err(GatewayError::Transport(_))));
}
