//! HTTP-level tests for the full router: cookies, auth, rate limiting and
//! the payment routes against a stub gateway.
//!
//! This test requires the `sqlite` feature flag.

#![cfg(feature = "sqlite")]

use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use donate_hex::{
    DonateService, ServiceConfig,
    inbound::{HttpServer, HttpSettings, Redirects},
    service::TokenConfig,
};
use donate_repo::{SqliteRepo, security::SecretCipher};
use donate_types::{GatewayError, PaymentGateway, PurchaseForm, TransactionListQuery};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use wayforpay::MerchantSettings;

/// Gateway that records purchase forms and answers with a fixed page.
#[derive(Clone, Default)]
struct StubGateway {
    forms: Arc<Mutex<Vec<PurchaseForm>>>,
}

#[async_trait::async_trait]
impl PaymentGateway for StubGateway {
    async fn submit_purchase(&self, form: PurchaseForm) -> Result<String, GatewayError> {
        self.forms.lock().unwrap().push(form);
        Ok("https://secure.wayforpay.com/pay?vkh=stub".into())
    }

    async fn list_transactions(
        &self,
        _query: TransactionListQuery,
    ) -> Result<Vec<Value>, GatewayError> {
        Ok(Vec::new())
    }
}

async fn create_app(requests_per_minute: u32) -> (Router, StubGateway) {
    let repo = SqliteRepo::new("sqlite::memory:").await.unwrap();
    let gateway = StubGateway::default();
    let service = DonateService::new(
        repo,
        gateway.clone(),
        SecretCipher::new(b"0123456789abcdef0123456789abcdef").unwrap(),
        ServiceConfig {
            tokens: TokenConfig {
                secret: "integration-secret".into(),
                ..Default::default()
            },
            merchant: MerchantSettings {
                domain_name: "donate.example".into(),
                approved_url: "http://localhost/wayforpay/successful".into(),
                declined_url: "http://localhost/wayforpay/unsuccessful".into(),
            },
        },
    );
    let settings = HttpSettings {
        cookie_secure: false,
        redirects: Redirects {
            approved: "https://front.example/thanks".into(),
            declined: "https://front.example/sorry".into(),
            after_oauth: None,
        },
        requests_per_minute,
    };
    (HttpServer::new(service, settings, None).router(), gateway)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_cookie(mut request: Request<Body>, access_token: &str) -> Request<Body> {
    request.headers_mut().insert(
        header::COOKIE,
        format!("access_token={access_token}").parse().unwrap(),
    );
    request
}

async fn body_json(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

fn cookie_value(cookies: &[String], name: &str) -> Option<String> {
    cookies.iter().find_map(|c| {
        let first = c.split(';').next()?;
        let (key, value) = first.split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Registers a user and returns `(user_id, access_token)`.
async fn register(app: &Router, email: &str) -> (String, String) {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/auth/user",
            json!({ "email": email, "password": "pw123456", "repeatPassword": "pw123456" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let cookies = set_cookies(&response);
    let access = cookie_value(&cookies, "access_token").expect("access cookie");
    let body = body_json(response).await;
    (body["userId"].as_str().unwrap().to_string(), access)
}

#[tokio::test]
async fn test_health() {
    let (app, _) = create_app(100).await;
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_register_sets_cookies_that_authenticate() {
    let (app, _) = create_app(100).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/auth/user",
            json!({ "email": "Ann@Example.com", "password": "pw", "repeatPassword": "pw" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|c| c.contains("HttpOnly") && c.contains("SameSite=Strict")));
    assert!(cookies.iter().any(|c| c.starts_with("access_token=") && c.ends_with("Max-Age=1800")));
    assert!(cookies.iter().any(|c| c.starts_with("refresh_token=") && c.ends_with("Max-Age=2592000")));

    let access = cookie_value(&cookies, "access_token").unwrap();
    let profile = app
        .oneshot(with_cookie(
            Request::builder().uri("/user/profile").body(Body::empty()).unwrap(),
            &access,
        ))
        .await
        .unwrap();
    assert_eq!(profile.status(), StatusCode::OK);

    let body = body_json(profile).await;
    assert_eq!(body["email"], "ann@example.com");
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_bearer_header_is_accepted() {
    let (app, _) = create_app(100).await;
    let (user_id, access) = register(&app, "bearer@example.com").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/user/profile?uuid={user_id}"))
                .header(header::AUTHORIZATION, format!("Bearer {access}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_route_without_token_is_401() {
    let (app, _) = create_app(100).await;
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/post/create",
            json!({ "title": "t", "content": "c", "goal": "g" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], 401);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let (app, _) = create_app(100).await;
    register(&app, "wrong@example.com").await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/auth/login",
            json!({ "email": "wrong@example.com", "password": "nope" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_logout_clears_cookies() {
    let (app, _) = create_app(100).await;
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|c| c.ends_with("Max-Age=0")));
}

#[tokio::test]
async fn test_post_lifecycle() {
    let (app, _) = create_app(100).await;
    let (user_id, access) = register(&app, "poster@example.com").await;

    let created = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                Method::POST,
                "/post/create",
                json!({ "title": "Drones", "content": "For the front", "goal": "1000 UAH" }),
            ),
            &access,
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let post_id = body_json(created).await["id"].as_i64().unwrap();

    let listed = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/post/all_posts/{user_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(listed).await.as_array().unwrap().len(), 1);

    let deleted = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/post/{post_id}"))
                .body(Body::empty())
                .unwrap(),
            &access,
        ))
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let missing = app
        .oneshot(
            Request::builder()
                .uri(format!("/post/{post_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_purchase_flow() {
    let (app, gateway) = create_app(100).await;
    let (_, access) = register(&app, "merchant@example.com").await;

    let saved = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                Method::POST,
                "/wayforpay/setting_up_details",
                json!({ "merchantAccount": "shop_1", "merchantSecret": "shop-secret" }),
            ),
            &access,
        ))
        .await
        .unwrap();
    assert_eq!(saved.status(), StatusCode::CREATED);
    assert_eq!(body_json(saved).await["message"], "Save data for WayForPay");

    let purchase = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                Method::POST,
                "/wayforpay",
                json!({ "productName": ["Drone", "Battery"], "amount": 150, "clientEmail": "payer@example.com" }),
            ),
            &access,
        ))
        .await
        .unwrap();
    assert_eq!(purchase.status(), StatusCode::OK);
    assert_eq!(
        body_json(purchase).await["redirectURL"],
        "https://secure.wayforpay.com/pay?vkh=stub"
    );

    let forms = gateway.forms.lock().unwrap().clone();
    let pairs = forms[0].to_pairs();
    assert!(pairs.contains(&("merchantAccount".into(), "shop_1".into())));
    assert!(pairs.contains(&("productName[]".into(), "Battery".into())));
    assert!(pairs.contains(&("clientEmail".into(), "payer@example.com".into())));
}

#[tokio::test]
async fn test_transaction_list_rejects_wide_window() {
    let (app, _) = create_app(100).await;
    let (_, access) = register(&app, "window@example.com").await;
    let day_ms: i64 = 24 * 60 * 60 * 1000;

    let response = app
        .oneshot(with_cookie(
            json_request(
                Method::POST,
                "/wayforpay/transaction_list",
                json!({ "dateBegin": 0, "dateEnd": 32 * day_ms }),
            ),
            &access,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Dates exceed 31 days");
}

#[tokio::test]
async fn test_payment_callbacks_redirect() {
    let (app, _) = create_app(100).await;

    for (uri, target) in [
        ("/wayforpay/successful", "https://front.example/thanks"),
        ("/wayforpay/unsuccessful", "https://front.example/sorry"),
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_redirection());
        assert_eq!(response.headers()[header::LOCATION], target);
    }
}

#[tokio::test]
async fn test_google_routes_without_provider_are_404() {
    let (app, _) = create_app(100).await;
    let response = app
        .oneshot(Request::builder().uri("/auth/google").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rate_limiting_returns_429_when_exceeded() {
    let (app, _) = create_app(3).await;

    for i in 1..=3 {
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/user/all").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_ne!(
            response.status(),
            StatusCode::TOO_MANY_REQUESTS,
            "Request {i} should not be rate limited"
        );
    }

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/user/all").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(response).await["retry_after_seconds"], 60);

    // Health stays reachable.
    let health = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (app, _) = create_app(100).await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"]["/wayforpay/transaction_list"].is_object());
}
