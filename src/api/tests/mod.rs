use super::*;
use crate::config::RegistryConfig;
use crate::convert::{DocumentRenderer, RendererCapabilities};
use crate::error::ConversionError;
use crate::pipeline::Pipeline;
use crate::registry::RegistryClient;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};


const PDF_BYTES: &[u8] = b"%PDF-1.4 stub";

/// Writes a fixed PDF body for any input
struct StubRenderer;

#[async_trait]
impl DocumentRenderer for StubRenderer {
    async fn render(&self, _input: &Path, output: &Path) -> std::result::Result<(), ConversionError> {
        tokio::fs::write(output, PDF_BYTES)
            .await
            .map_err(|source| ConversionError::Io {
                path: output.to_path_buf(),
                source,
            })
    }

    fn capabilities(&self) -> RendererCapabilities {
        RendererCapabilities {
            can_render: true,
            local_assets: true,
        }
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Config pointing the registry at the mock server and output into `dir`
fn test_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.registry = RegistryConfig {
        user_agent: "Test Agent test@example.com".into(),
        request_delay: Duration::ZERO,
        submissions_base: format!("{}/submissions", server.uri()),
        archive_base: format!("{}/Archives/edgar/data", server.uri()),
        ..Default::default()
    };
    config.output.output_dir = dir.path().join("out");
    config
}

fn tracker_for(config: &Config) -> JobTracker {
    let pipeline = Pipeline::new(
        RegistryClient::new(&config.registry).unwrap(),
        Arc::new(StubRenderer),
        "10-K",
    )
    .with_companies(config.companies.clone());
    JobTracker::new(pipeline, config.output.output_dir.clone())
}

async fn test_app(server: &MockServer, dir: &TempDir) -> (Router, JobTracker) {
    let config = test_config(server, dir);
    let tracker = tracker_for(&config);
    (create_router(tracker.clone(), Arc::new(config)), tracker)
}

/// Serve Apple's metadata and primary document
async fn mount_apple(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/submissions/CIK0000320193.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cik": "320193",
            "name": "Apple Inc.",
            "filings": {"recent": {
                "form": ["10-K", "10-Q"],
                "accessionNumber": ["0000320193-25-000079", "0000320193-25-000073"],
                "filingDate": ["2025-10-31", "2025-08-01"],
                "primaryDocument": ["aapl-20250927.htm", "aapl-20250628.htm"]
            }}
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(
            "/Archives/edgar/data/320193/000032019325000079/aapl-20250927.htm",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Apple 10-K</html>"))
        .mount(server)
        .await;
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_cors_enabled() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server, &dir);
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["*".to_string()];
    let app = create_router(tracker_for(&config), Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server, &dir);
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["http://dashboard.local".to_string()];
    let app = create_router(tracker_for(&config), Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://dashboard.local")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://dashboard.local")
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server, &dir);
    config.api.cors_enabled = false;
    let app = create_router(tracker_for(&config), Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_swagger_ui_toggle() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let mut config = test_config(&server, &dir);
    config.api.swagger_ui = true;
    let app = create_router(tracker_for(&config), Arc::new(config.clone()));
    let (status, spec) = get_json(&app, "/api/docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(spec["info"]["title"], "filing-dl REST API");

    config.api.swagger_ui = false;
    let app = create_router(tracker_for(&config), Arc::new(config));
    let request = Request::builder()
        .uri("/api/docs/openapi.json")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_server_stops_on_shutdown_signal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (app, _tracker) = test_app(&server, &dir).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let handle = tokio::spawn(serve(listener, app, async move {
        stop_rx.await.ok();
    }));

    let response = reqwest::get(format!("http://{address}/health")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    drop(response);

    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
