//! Dispatcher-level tests: health, fallback, isolation, timeout,
//! cancellation, and cross-request independence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value};

use invoice_lab::collab::Collaborators;
use invoice_lab::config::AppConfig;
use invoice_lab::dispatch::Dispatcher;
use invoice_lab::http::outcome::Reply;
use invoice_lab::routing::{handler, Category, Registry};

async fn collaborators() -> Collaborators {
    Collaborators::new(&AppConfig::default()).await.unwrap()
}

fn dispatcher(registry: Registry, collab: Collaborators, ceiling: Duration) -> Dispatcher {
    Dispatcher::new(
        Arc::new(registry),
        Arc::new(collab),
        ceiling,
        1024 * 1024,
    )
}

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::http::Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_works_with_empty_registry() {
    let d = dispatcher(Registry::new(), collaborators().await, Duration::from_secs(5));

    let response = d.handle(get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn unknown_route_is_404_with_fixed_body() {
    let d = dispatcher(Registry::new(), collaborators().await, Duration::from_secs(5));

    let response = d.handle(get("/does-not-exist")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await, json!({"error": "not found"}));
}

#[tokio::test]
async fn wrong_method_is_405() {
    let mut registry = Registry::new();
    registry
        .register(
            Method::GET,
            "/api/thing",
            Category::Other,
            "get only",
            handler(|_ctx, _collab| async { Ok(Reply::ok_json(json!({}))) }),
        )
        .unwrap();
    let d = dispatcher(registry, collaborators().await, Duration::from_secs(5));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/thing")
        .body(Body::empty())
        .unwrap();
    let response = d.handle(request).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn panicking_handler_is_contained() {
    let mut registry = Registry::new();
    registry
        .register(
            Method::GET,
            "/api/panic",
            Category::Other,
            "always panics",
            handler(|_ctx, _collab| async { panic!("demo handler blew up") }),
        )
        .unwrap();
    registry
        .register(
            Method::GET,
            "/api/fine",
            Category::Other,
            "always fine",
            handler(|_ctx, _collab| async { Ok(Reply::ok_json(json!({"ok": true}))) }),
        )
        .unwrap();
    let d = dispatcher(registry, collaborators().await, Duration::from_secs(5));

    let response = d.handle(get("/api/panic")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("demo handler blew up"));

    // The dispatcher keeps serving after a panic.
    let response = d.handle(get("/api/fine")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn hung_handler_times_out_and_releases_resources() {
    struct Guard(Arc<AtomicBool>);
    impl Drop for Guard {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    let released = Arc::new(AtomicBool::new(false));
    let flag = released.clone();

    let mut registry = Registry::new();
    registry
        .register(
            Method::GET,
            "/api/hang",
            Category::Other,
            "never resolves",
            handler(move |_ctx, _collab| {
                let flag = flag.clone();
                async move {
                    let _guard = Guard(flag);
                    std::future::pending::<()>().await;
                    Ok(Reply::ok_json(json!({})))
                }
            }),
        )
        .unwrap();
    let d = dispatcher(registry, collaborators().await, Duration::from_millis(100));

    let response = d.handle(get("/api/hang")).await;
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

    // Abort drops the handler future; the scoped resource must be gone.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(released.load(Ordering::SeqCst));
}

#[tokio::test]
async fn concurrent_requests_are_independent() {
    let mut registry = Registry::new();
    registry
        .register(
            Method::GET,
            "/api/slow",
            Category::Other,
            "hangs until the ceiling",
            handler(|_ctx, _collab| async {
                std::future::pending::<()>().await;
                Ok(Reply::ok_json(json!({})))
            }),
        )
        .unwrap();
    registry
        .register(
            Method::GET,
            "/api/fast",
            Category::Other,
            "returns immediately",
            handler(|_ctx, _collab| async { Ok(Reply::ok_json(json!({"fast": true}))) }),
        )
        .unwrap();
    let d = Arc::new(dispatcher(
        registry,
        collaborators().await,
        Duration::from_millis(500),
    ));

    let slow = {
        let d = d.clone();
        tokio::spawn(async move { d.handle(get("/api/slow")).await })
    };

    let start = Instant::now();
    let fast = d.handle(get("/api/fast")).await;
    assert_eq!(fast.status(), StatusCode::OK);
    assert!(
        start.elapsed() < Duration::from_millis(400),
        "fast request must not wait for the slow one"
    );

    let slow = slow.await.unwrap();
    assert_eq!(slow.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn malformed_json_body_yields_500_not_crash() {
    let mut registry = Registry::new();
    registry
        .register(
            Method::POST,
            "/api/needs-json",
            Category::Other,
            "requires a JSON body",
            handler(|ctx, _collab| async move {
                let body = ctx.json_body()?;
                Ok(Reply::ok_json(body.clone()))
            }),
        )
        .unwrap();
    let d = dispatcher(registry, collaborators().await, Duration::from_secs(5));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/needs-json")
        .header("content-type", "application/json")
        .body(Body::from("{broken"))
        .unwrap();
    let response = d.handle(request).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("invalid JSON body"));
}
