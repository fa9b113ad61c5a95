use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use live_proxy_pool::server::router;
use live_proxy_pool::{PoolStore, ServiceFacade};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn app(dir: &TempDir) -> (axum::Router, Arc<PoolStore>) {
    let store = Arc::new(PoolStore::open(dir.path().join("data.json")).unwrap());
    let facade = Arc::new(ServiceFacade::new(Arc::clone(&store)));
    (router(facade), store)
}

async fn call(app: axum::Router, request: Request<Body>) -> Value {
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn add(form_body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/add")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form_body))
        .unwrap()
}

#[tokio::test]
async fn get_on_empty_pool_returns_empty_string() {
    let dir = TempDir::new().unwrap();
    let (app, _) = app(&dir);
    let body = call(app, get("/get")).await;
    assert_eq!(body["code"], 1);
    assert_eq!(body["data"], "");
}

#[tokio::test]
async fn add_then_list_and_get() {
    let dir = TempDir::new().unwrap();
    let (app, store) = app(&dir);

    // proxies=["1.2.3.4:80"]
    let body = call(app.clone(), add("proxies=%5B%221.2.3.4%3A80%22%5D")).await;
    assert_eq!(body["code"], 1);
    assert_eq!(body["data"], r#"["1.2.3.4:80"]"#);
    assert_eq!(store.len(), 1);

    let body = call(app.clone(), get("/list")).await;
    assert_eq!(body["data"], json!(["http://1.2.3.4:80"]));

    let body = call(app, get("/get")).await;
    assert_eq!(body["data"], "http://1.2.3.4:80");
}

#[tokio::test]
async fn add_is_deduplicated_and_persisted() {
    let dir = TempDir::new().unwrap();
    let (app, store) = app(&dir);

    call(app.clone(), add("proxies=%5B%221.2.3.4%3A80%22%5D")).await;
    call(app.clone(), add("proxies=%5B%221.2.3.4%3A80%22%2C%225.6.7.8%3A3128%22%5D")).await;

    let body = call(app, get("/list")).await;
    assert_eq!(body["data"], json!(["http://1.2.3.4:80", "http://5.6.7.8:3128"]));

    let on_disk: Vec<String> =
        serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(on_disk, vec!["http://1.2.3.4:80", "http://5.6.7.8:3128"]);
}

#[tokio::test]
async fn malformed_add_returns_error_code() {
    let dir = TempDir::new().unwrap();
    let (app, store) = app(&dir);

    let body = call(app, add("proxies=not-json")).await;
    assert_eq!(body["code"], 2);
    assert!(body["message"].is_string());
    assert_eq!(body["data"], "not-json");
    assert!(store.is_empty());
}

#[tokio::test]
async fn add_accepts_multipart_form() {
    let dir = TempDir::new().unwrap();
    let (app, store) = app(&dir);

    let body = "--XBOUNDARY\r\n\
        Content-Disposition: form-data; name=\"proxies\"\r\n\r\n\
        [\"1.2.3.4:80\"]\r\n\
        --XBOUNDARY--\r\n";
    let request = Request::builder()
        .method("POST")
        .uri("/add")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
        .body(Body::from(body))
        .unwrap();

    let body = call(app, request).await;
    assert_eq!(body["code"], 1);
    assert_eq!(body["data"], r#"["1.2.3.4:80"]"#);
    assert_eq!(store.list(), vec!["http://1.2.3.4:80"]);
}

#[tokio::test]
async fn add_without_content_type_returns_envelope() {
    let dir = TempDir::new().unwrap();
    let (app, store) = app(&dir);

    let request = Request::builder()
        .method("POST")
        .uri("/add")
        .body(Body::empty())
        .unwrap();
    let body = call(app, request).await;
    assert_eq!(body["code"], 2);
    assert_eq!(body["data"], "");
    assert!(store.is_empty());
}

#[tokio::test]
async fn add_with_json_body_returns_envelope() {
    let dir = TempDir::new().unwrap();
    let (app, store) = app(&dir);

    let request = Request::builder()
        .method("POST")
        .uri("/add")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"proxies":["1.2.3.4:80"]}"#))
        .unwrap();
    let body = call(app, request).await;
    assert_eq!(body["code"], 2);
    assert!(store.is_empty());
}

#[tokio::test]
async fn add_without_proxies_field_is_an_error() {
    let dir = TempDir::new().unwrap();
    let (app, store) = app(&dir);

    let body = call(app, add("other=1")).await;
    assert_eq!(body["code"], 2);
    assert_eq!(body["data"], "");
    assert!(store.is_empty());
}
