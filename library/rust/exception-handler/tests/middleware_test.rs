//! ミドルウェア統合テスト（tower::ServiceExt + oneshot）。

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::routing::get;
use axum::{middleware, Router};
use tower::ServiceExt;

use k1s0_exception_handler::{
    exception_middleware, maintenance_middleware, ApiFault, ExceptionHandler,
    ExceptionKindRegistry, Fault, MaintenanceSwitch, Posture, ResponseResolver,
};

async fn ok() -> &'static str {
    "pong"
}

async fn quota() -> Result<&'static str, Fault> {
    Err(ApiFault::new(
        "QuotaExceeded",
        "SYS_API_QUOTA_EXCEEDED",
        StatusCode::TOO_MANY_REQUESTS,
        "quota exceeded",
    )
    .into())
}

async fn crash() -> Result<&'static str, Fault> {
    Err(Fault::unknown(anyhow::anyhow!("database is on fire")))
}

fn make_app(posture: Posture, switch: MaintenanceSwitch) -> Router {
    let resolver = ResponseResolver::new(Arc::new(ExceptionKindRegistry::with_defaults()));
    let handler = ExceptionHandler::new(resolver, posture);
    Router::new()
        .route("/api/v1/ping", get(ok))
        .route("/api/v1/quota", get(quota))
        .route("/api/v1/crash", get(crash).post(crash))
        .route("/crash", get(crash))
        .route("/healthz", get(ok))
        .layer(middleware::from_fn_with_state(switch, maintenance_middleware))
        .layer(middleware::from_fn_with_state(handler, exception_middleware))
}

async fn send(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn test_success_passes_through() {
    let app = make_app(Posture::production(), MaintenanceSwitch::new());
    let (status, body) = send(app, "/api/v1/ping").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "pong");
}

#[tokio::test]
async fn test_domain_fault_rendered_as_json() {
    let app = make_app(Posture::production(), MaintenanceSwitch::new());
    let (status, body) = send(app, "/api/v1/quota").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    let json = json(&body);
    assert_eq!(json["error"]["code"], "SYS_API_QUOTA_EXCEEDED");
    assert_eq!(json["error"]["message"], "quota exceeded");
}

#[tokio::test]
async fn test_unknown_fault_hidden_in_production() {
    let app = make_app(Posture::production(), MaintenanceSwitch::new());
    let (status, body) = send(app, "/api/v1/crash").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal Server Error");
}

#[tokio::test]
async fn test_unknown_fault_json_with_test_mode() {
    let app = make_app(Posture::production(), MaintenanceSwitch::new());
    let (status, body) = send(app, "/api/v1/crash?__test_mode=1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json = json(&body);
    assert_eq!(json["error"]["code"], "SYS_API_INTERNAL_ERROR");
    assert_eq!(json["error"]["message"], "Something went wrong.");
}

#[tokio::test]
async fn test_unknown_fault_json_with_non_boolean_test_mode() {
    let app = make_app(Posture::production(), MaintenanceSwitch::new());
    let (_, body) = send(app, "/api/v1/crash?__test_mode=2").await;
    assert_eq!(json(&body)["error"]["code"], "SYS_API_INTERNAL_ERROR");
}

#[tokio::test]
async fn test_unknown_fault_json_with_test_mode_in_form_body() {
    let app = make_app(Posture::production(), MaintenanceSwitch::new());
    let body = "__test_mode=1";
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/crash")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .header(header::CONTENT_LENGTH, body.len())
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"]["message"], "Something went wrong.");
}

#[tokio::test]
async fn test_unknown_fault_json_in_debug() {
    let app = make_app(Posture::debug(), MaintenanceSwitch::new());
    let (_, body) = send(app, "/api/v1/crash").await;
    assert_eq!(json(&body)["error"]["message"], "Something went wrong.");
}

#[tokio::test]
async fn test_non_api_crash_uses_default_renderer_even_in_debug() {
    let app = make_app(Posture::debug(), MaintenanceSwitch::new());
    let (status, body) = send(app, "/crash?__test_mode=1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("database is on fire"));
}

#[tokio::test]
async fn test_maintenance_json_on_api() {
    let switch = MaintenanceSwitch::new();
    switch.enable();
    let app = make_app(Posture::production(), switch);
    let (status, body) = send(app, "/api/v1/ping").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let json = json(&body);
    assert_eq!(json["error"]["code"], "SYS_API_MAINTAIN_MODE");
    assert_eq!(json["error"]["message"], "Maintaining");
}

#[tokio::test]
async fn test_maintenance_plain_text_off_api() {
    let switch = MaintenanceSwitch::new().with_retry_after(30);
    switch.enable();
    let app = make_app(Posture::production(), switch);
    let response = app
        .oneshot(Request::builder().uri("/crash").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()["retry-after"], "30");
}

#[tokio::test]
async fn test_maintenance_except_path() {
    let switch = MaintenanceSwitch::new().with_except("/healthz");
    switch.enable();
    let app = make_app(Posture::production(), switch);
    let (status, _) = send(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_header_echoed_in_body() {
    let app = make_app(Posture::production(), MaintenanceSwitch::new());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/quota")
                .header("x-request-id", "req-from-gateway")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"]["request_id"], "req-from-gateway");
}
