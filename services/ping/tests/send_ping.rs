use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use httpmock::Method::GET;
use httpmock::MockServer;
use serde_json::json;
use tower::ServiceExt;

use ping_service::{router, AppState, PONG_SERVICE};
use pingpong_mesh::{Discovery, Dispatcher, ServiceInstance, ServiceName, StaticDiscovery};

struct CountingDiscovery {
    inner: StaticDiscovery,
    calls: AtomicUsize,
}

#[async_trait]
impl Discovery for CountingDiscovery {
    async fn resolve(&self, service: &ServiceName) -> Result<Option<ServiceInstance>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve(service).await
    }
}

fn ping_name() -> ServiceName {
    ServiceName::parse("ping-service").unwrap()
}

fn app_with(discovery: Arc<dyn Discovery>, timeout: Duration) -> Router {
    let dispatcher = Arc::new(Dispatcher::new(discovery, timeout).unwrap());
    router(AppState::new(dispatcher, ping_name()))
}

async fn app_for(server: &MockServer) -> Router {
    let discovery = StaticDiscovery::new();
    discovery
        .register(ServiceName::parse(PONG_SERVICE).unwrap(), &server.base_url())
        .await;
    app_with(Arc::new(discovery), Dispatcher::DEFAULT_TIMEOUT)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

#[tokio::test]
async fn root_returns_ping() {
    let app = app_with(Arc::new(StaticDiscovery::new()), Dispatcher::DEFAULT_TIMEOUT);
    let (status, body) = get(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"Ping!");
}

#[tokio::test]
async fn send_ping_relays_pong_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/").header("x-mesh-from", "ping-service");
            then.status(200).header("content-type", "text/plain").body("Pong!");
        })
        .await;

    let (status, body) = get(app_for(&server).await, "/send-ping").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"Pong!");
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn send_ping_relays_whole_response_on_non_200() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(404).body("Not Found");
        })
        .await;

    let (status, body) = get(app_for(&server).await, "/send-ping").await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"statusCode": 404, "body": "Not Found"}));
}

#[tokio::test]
async fn send_ping_returns_error_object_when_unresolvable() {
    let discovery = Arc::new(CountingDiscovery {
        inner: StaticDiscovery::new(),
        calls: AtomicUsize::new(0),
    });
    let app = app_with(discovery.clone(), Dispatcher::DEFAULT_TIMEOUT);

    let (status, body) = get(app, "/send-ping").await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        json,
        json!({"error": {"kind": "service_not_found", "message": "Service not found: pong-service"}})
    );
    assert_eq!(discovery.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn send_ping_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).body("Pong!").delay(Duration::from_millis(500));
        })
        .await;

    let discovery = StaticDiscovery::new();
    discovery
        .register(ServiceName::parse(PONG_SERVICE).unwrap(), &server.base_url())
        .await;
    let app = app_with(Arc::new(discovery), Duration::from_millis(50));

    let (status, body) = get(app, "/send-ping").await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json["error"]["kind"], "timeout");
}

#[tokio::test]
async fn concurrent_send_pings_are_independent() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200)
                .body("Pong!")
                .delay(Duration::from_millis(20));
        })
        .await;

    let reachable = app_for(&server).await;
    let unreachable = app_with(Arc::new(StaticDiscovery::new()), Dispatcher::DEFAULT_TIMEOUT);

    let requests = (0..20).map(|i| {
        let app = if i % 2 == 0 {
            reachable.clone()
        } else {
            unreachable.clone()
        };
        async move { (i, get(app, "/send-ping").await) }
    });
    let results = futures::future::join_all(requests).await;

    for (i, (status, body)) in results {
        if i % 2 == 0 {
            assert_eq!(status, StatusCode::OK, "request {i}");
            assert_eq!(body, b"Pong!", "request {i}");
        } else {
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "request {i}");
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["error"]["kind"], "service_not_found", "request {i}");
        }
    }
    mock.assert_hits_async(10).await;
}
