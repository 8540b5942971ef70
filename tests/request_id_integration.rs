use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use tower::ServiceExt;

use skin_favicon::{AppConfig, AppState, build_app};

fn build() -> axum::Router {
    // 上游指向不可达地址；这里只走不访问上游的路由
    let mut config = AppConfig::default();
    config.upstream.username_lookup_url = "http://127.0.0.1:9/users/".to_string();
    config.upstream.session_profile_url = "http://127.0.0.1:9/session/".to_string();
    let state = AppState::from_config(&config).expect("state");
    build_app(state, &config)
}

fn header_value(resp: &axum::response::Response, name: &str) -> String {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

#[tokio::test]
async fn request_id_is_generated_when_missing() {
    let resp = build()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request /health");

    assert_eq!(resp.status(), StatusCode::OK);
    let request_id = header_value(&resp, "x-request-id");
    assert!(request_id.starts_with("req_"), "generated id: {request_id}");
}

#[tokio::test]
async fn request_id_uses_client_value_when_valid() {
    let resp = build()
        .oneshot(
            Request::builder()
                .uri("/")
                .header("x-request-id", "client.req-001")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request /");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_value(&resp, "x-request-id"), "client.req-001");
}

#[tokio::test]
async fn unsafe_client_value_is_replaced() {
    let resp = build()
        .oneshot(
            Request::builder()
                .uri("/")
                .header("x-request-id", "bad id with spaces")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request /");

    assert!(header_value(&resp, "x-request-id").starts_with("req_"));
}

#[tokio::test]
async fn error_body_contains_request_id() {
    let resp = build()
        .oneshot(
            Request::builder()
                .uri("/name/Notch?size=0")
                .header("x-request-id", "err.req-001")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request /name/Notch");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let request_id_header = header_value(&resp, "x-request-id");

    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("parse json");
    assert_eq!(json["requestId"].as_str(), Some(request_id_header.as_str()));
    assert_eq!(json["status"], 422);
}
