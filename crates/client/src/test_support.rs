//! Local stand-in for the hosted backend: storage buckets, object uploads and
//! the facial-recognition function.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use veritas_protocol::FACIAL_RECOGNITION_PATH;

#[derive(Clone)]
pub(crate) struct FakeBackend {
    log: Arc<Mutex<Vec<String>>>,
    buckets: Arc<Mutex<Vec<String>>>,
    function_status: StatusCode,
    function_body: Value,
}

impl FakeBackend {
    /// The function answers every call with `status` and `body`.
    pub(crate) fn answering(status: u16, body: Value) -> Self {
        Self {
            log: Arc::default(),
            buckets: Arc::default(),
            function_status: StatusCode::from_u16(status).unwrap(),
            function_body: body,
        }
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn push(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }

    pub(crate) async fn serve(&self) -> String {
        let router = Router::new()
            .route("/storage/v1/bucket", get(list_buckets).post(create_bucket))
            .route("/storage/v1/object/*path", post(upload_object))
            .route(FACIAL_RECOGNITION_PATH, post(analyze))
            .with_state(self.clone());
        serve(router).await
    }
}

/// Serves `router` on an ephemeral port and returns its base url.
pub(crate) async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn api_key(headers: &HeaderMap) -> &str {
    headers
        .get("apikey")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

async fn list_buckets(State(fake): State<FakeBackend>) -> Json<Value> {
    fake.push("list".to_string());
    let buckets = fake.buckets.lock().unwrap().clone();
    Json(json!(buckets
        .iter()
        .map(|name| json!({"id": name, "name": name}))
        .collect::<Vec<_>>()))
}

async fn create_bucket(State(fake): State<FakeBackend>, Json(body): Json<Value>) -> StatusCode {
    let name = body["name"].as_str().unwrap_or_default().to_string();
    fake.push(format!("create {name} public={}", body["public"]));
    fake.buckets.lock().unwrap().push(name);
    StatusCode::OK
}

async fn upload_object(
    State(fake): State<FakeBackend>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    fake.push(format!(
        "upload {} key={} bytes={}",
        uri.path(),
        api_key(&headers),
        body.len()
    ));
    StatusCode::OK
}

async fn analyze(
    State(fake): State<FakeBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    fake.push(format!(
        "function key={} imageUrl={}",
        api_key(&headers),
        body["imageUrl"].as_str().unwrap_or_default()
    ));
    (fake.function_status, Json(fake.function_body.clone())).into_response()
}
