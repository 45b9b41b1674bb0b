//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use todo_sync::ClientConfig;

/// What the table server saw.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
}

/// In-memory table behind the mock server.
#[derive(Default)]
pub struct TableState {
    pub items: Mutex<BTreeMap<String, Value>>,
    pub requests: Mutex<Vec<RecordedRequest>>,
    pub required_token: Option<String>,
    next_version: AtomicU64,
}

impl TableState {
    pub fn with_token(token: &str) -> Self {
        Self {
            required_token: Some(token.to_string()),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn stamp(&self, id: &str, mut item: Value) -> Value {
        let version = self.next_version.fetch_add(1, Ordering::SeqCst) + 1;
        item["id"] = id.into();
        item["version"] = format!("v{}", version).into();
        item["updatedAt"] = chrono::Utc::now().to_rfc3339().into();
        item["deleted"] = false.into();
        item
    }
}

/// Start the mock table server on an ephemeral port.
pub async fn start_table_server(state: Arc<TableState>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new()
        .route("/tables/todoitem", get(list).post(insert))
        .route("/tables/todoitem/{id}", get(read).put(replace).delete(remove))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Client configuration pointing at `addr`.
pub fn config_for(addr: SocketAddr) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.endpoint.service_uri = format!("http://{}/", addr);
    config.timeouts.request_secs = 5;
    config
}

async fn record(State(state): State<Arc<TableState>>, request: Request, next: Next) -> Response {
    state.requests.lock().unwrap().push(RecordedRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
        headers: request.headers().clone(),
    });

    if let Some(expected) = &state.required_token {
        let presented = request
            .headers()
            .get("x-zumo-auth")
            .and_then(|v| v.to_str().ok());
        if presented != Some(expected.as_str()) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    next.run(request).await
}

fn version_matches(headers: &HeaderMap, current: &Value) -> bool {
    match headers.get("if-match").and_then(|v| v.to_str().ok()) {
        Some(expected) => current["version"].as_str() == Some(expected.trim_matches('"')),
        None => true,
    }
}

async fn list(State(state): State<Arc<TableState>>) -> Json<Vec<Value>> {
    Json(state.items.lock().unwrap().values().cloned().collect())
}

async fn insert(State(state): State<Arc<TableState>>, Json(item): Json<Value>) -> Response {
    let id = item
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let mut items = state.items.lock().unwrap();
    if items.contains_key(&id) {
        return (StatusCode::CONFLICT, Json(items[&id].clone())).into_response();
    }
    let stored = state.stamp(&id, item);
    items.insert(id, stored.clone());
    (StatusCode::CREATED, Json(stored)).into_response()
}

async fn read(State(state): State<Arc<TableState>>, Path(id): Path<String>) -> Response {
    match state.items.lock().unwrap().get(&id) {
        Some(item) => Json(item.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn replace(
    State(state): State<Arc<TableState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(item): Json<Value>,
) -> Response {
    let mut items = state.items.lock().unwrap();
    let Some(current) = items.get(&id).cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !version_matches(&headers, &current) {
        return (StatusCode::PRECONDITION_FAILED, Json(current)).into_response();
    }
    let stored = state.stamp(&id, item);
    items.insert(id, stored.clone());
    Json(stored).into_response()
}

async fn remove(
    State(state): State<Arc<TableState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut items = state.items.lock().unwrap();
    let Some(current) = items.get(&id).cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !version_matches(&headers, &current) {
        return (StatusCode::PRECONDITION_FAILED, Json(current)).into_response();
    }
    items.remove(&id);
    StatusCode::NO_CONTENT.into_response()
}

/// Start a raw backend that answers every connection with a fixed response.
/// Returns its address and a hit counter.
pub async fn start_raw_backend(status: u16, body: &'static str) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, hits)
}
