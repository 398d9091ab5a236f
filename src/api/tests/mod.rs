use super::*;
use crate::remote::fake::{Call, FakeRemote, Scripted};
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;


fn test_config() -> Config {
    let mut config = Config::default();
    config.remote.owner = "acme".to_string();
    config.remote.repo = "builds".to_string();
    config.remote.token = Some("ghp_testtoken123".to_string());
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    config
}

/// Router over a scripted remote
fn test_app(config: Config) -> (Router, Arc<FakeRemote>) {
    let fake = Arc::new(FakeRemote::new());
    let service = Arc::new(BuildService::with_remote(config.clone(), fake.clone()));
    (create_router(service, Arc::new(config)), fake)
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_api_server_starts_and_stops_on_signal() {
    let config = Arc::new(test_config());
    let service = Arc::new(BuildService::with_remote(
        (*config).clone(),
        Arc::new(FakeRemote::new()),
    ));
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let api_handle = tokio::spawn(start_api_server(service, config, async move {
        rx.await.ok();
    }));

    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), api_handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_health_endpoint_reports_configuration() {
    let (app, fake) = test_app(test_config());

    let response = app.oneshot(get("/api/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
    assert_eq!(body["config"]["hasGithubToken"], true);
    assert_eq!(body["config"]["repoOwner"], "acme");
    assert_eq!(body["config"]["repoName"], "builds");
    assert!(
        !body.to_string().contains("ghp_testtoken123"),
        "token must never be exposed"
    );
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_health_without_token() {
    let mut config = test_config();
    config.remote.token = None;
    let (app, _fake) = test_app(config);

    let body = json_body(app.oneshot(get("/api/health")).await.unwrap()).await;

    assert_eq!(body["config"]["hasGithubToken"], false);
}

#[tokio::test]
async fn test_unknown_api_path_lists_endpoints() {
    let (app, _fake) = test_app(test_config());

    let response = app.oneshot(get("/api/nope")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "not_found");
    assert_eq!(body["error"]["details"]["path"], "/api/nope");
    let endpoints = body["error"]["details"]["availableEndpoints"]
        .as_array()
        .unwrap();
    assert!(endpoints.contains(&json!("POST /api/build")));
}

#[tokio::test]
async fn test_openapi_endpoint() {
    let (app, _fake) = test_app(test_config());

    let response = app.oneshot(get("/api/openapi.json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["paths"]["/api/build"].is_object());
}

#[tokio::test]
async fn test_swagger_ui_can_be_disabled() {
    let mut config = test_config();
    config.api.swagger_ui = false;
    let (app, _fake) = test_app(config);

    let response = app.oneshot(get("/swagger-ui/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_enabled() {
    let (app, _fake) = test_app(test_config());

    let request = Request::builder()
        .uri("/api/health")
        .header("Origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_restricted_origins() {
    let mut config = test_config();
    config.api.cors_origins = vec!["https://app.example.com".to_string()];
    let (app, _fake) = test_app(config);

    let request = Request::builder()
        .uri("/api/health")
        .header("Origin", "https://app.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "https://app.example.com"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let mut config = test_config();
    config.api.cors_enabled = false;
    let (app, _fake) = test_app(config);

    let request = Request::builder()
        .uri("/api/health")
        .header("Origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}
