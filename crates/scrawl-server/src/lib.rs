//! Scrawl persistence server
//!
//! Keeps named canvases in memory behind the `/canvases` REST API:
//!
//! ```text
//! GET    /canvases          list records (documents omitted)
//! POST   /canvases          { "project_id", "title" } -> 201 + record
//! GET    /canvases/{id}     record with its document
//! PUT    /canvases/{id}     { "data": <document> } -> 204
//! DELETE /canvases/{id}     -> 204
//! GET    /health
//! ```
//!
//! `PUT` replaces the whole document, so concurrent writers resolve as
//! last-write-wins.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use dashmap::DashMap;
use scrawl_core::storage::{CanvasData, CanvasRecord, NewCanvas};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use uuid::Uuid;

const DEFAULT_PORT: u16 = 3030;

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("canvas not found: {0}")]
    NotFound(String),
    #[error("invalid request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Shared application state.
#[derive(Default)]
pub struct AppState {
    canvases: DashMap<String, CanvasRecord>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn shared() -> SharedState {
        Arc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.canvases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canvases.is_empty()
    }
}

/// Build the router over `state`.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/canvases", get(list_canvases).post(create_canvas))
        .route(
            "/canvases/{id}",
            get(get_canvas).put(put_canvas).delete(delete_canvas),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Listen address: `SCRAWL_ADDR` wins, then `PORT` on all interfaces.
pub fn bind_addr(scrawl_addr: Option<&str>, port: Option<&str>) -> SocketAddr {
    if let Some(addr) = scrawl_addr {
        match addr.parse() {
            Ok(addr) => return addr,
            Err(e) => warn!("Ignoring SCRAWL_ADDR {addr:?}: {e}"),
        }
    }
    let port = match port.map(str::parse::<u16>) {
        Some(Ok(port)) => port,
        Some(Err(e)) => {
            warn!("Ignoring PORT: {e}");
            DEFAULT_PORT
        }
        None => DEFAULT_PORT,
    };
    SocketAddr::from(([0, 0, 0, 0], port))
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

async fn list_canvases(State(state): State<SharedState>) -> Json<Vec<CanvasRecord>> {
    let mut records: Vec<CanvasRecord> = state
        .canvases
        .iter()
        .map(|entry| CanvasRecord {
            data: Value::Null,
            ..entry.value().clone()
        })
        .collect();
    records.sort_by(|a, b| a.id.cmp(&b.id));
    Json(records)
}

async fn create_canvas(
    State(state): State<SharedState>,
    Json(body): Json<NewCanvas>,
) -> (StatusCode, Json<CanvasRecord>) {
    let record = CanvasRecord::new(Uuid::new_v4().to_string(), Some(body.project_id), body.title);
    state.canvases.insert(record.id.clone(), record.clone());
    info!("Created canvas {} ({:?})", record.id, record.title);
    (StatusCode::CREATED, Json(record))
}

async fn get_canvas(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CanvasRecord>> {
    state
        .canvases
        .get(&id)
        .map(|entry| Json(entry.value().clone()))
        .ok_or(ApiError::NotFound(id))
}

async fn put_canvas(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<CanvasData>,
) -> ApiResult<StatusCode> {
    if !(body.data.is_object() || body.data.is_array()) {
        return Err(ApiError::BadRequest(
            "data must be a JSON object or array".to_string(),
        ));
    }
    let mut entry = state
        .canvases
        .get_mut(&id)
        .ok_or_else(|| ApiError::NotFound(id.clone()))?;
    entry.data = body.data;
    debug!("Saved canvas {id}");
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_canvas(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    match state.canvases.remove(&id) {
        Some(_) => {
            info!("Deleted canvas {id}");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::NotFound(id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrawl_core::storage::{CanvasStore, RestStore, StorageError};

    async fn spawn_server() -> (String, SharedState) {
        let state = AppState::shared();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), state)
    }

    #[tokio::test]
    async fn test_rest_round_trip() {
        let (base, state) = spawn_server().await;
        let store = RestStore::new(base);

        let record = store.create("proj-1", "Org chart").await.unwrap();
        assert_eq!(record.project_id.as_deref(), Some("proj-1"));
        assert_eq!(state.len(), 1);

        let document = json!({
            "elements": [{"type": "rectangle", "id": "a", "x": 0, "y": 0, "width": 10, "height": 10}],
            "appState": {"zoom": 1.5}
        });
        store.put(&record.id, document.clone()).await.unwrap();
        let loaded = store.get(&record.id).await.unwrap();
        assert_eq!(loaded.title, "Org chart");
        assert_eq!(loaded.data, document);

        assert_eq!(store.list().await.unwrap(), vec![record.id.clone()]);

        store.delete(&record.id).await.unwrap();
        assert!(matches!(store.get(&record.id).await, Err(StorageError::NotFound(_))));
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn test_missing_canvas_is_not_found() {
        let (base, _) = spawn_server().await;
        let store = RestStore::new(base);
        assert!(matches!(
            store.put("nope", json!({"elements": []})).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(store.delete("nope").await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_scalar_document_is_rejected() {
        let (base, _) = spawn_server().await;
        let store = RestStore::new(base);
        let record = store.create("p", "t").await.unwrap();
        match store.put(&record.id, json!(42)).await {
            Err(StorageError::Http(message)) => assert!(message.starts_with("HTTP 400")),
            other => panic!("expected a 400, got {other:?}"),
        }
    }

    #[test]
    fn test_bind_addr() {
        assert_eq!(bind_addr(None, None), SocketAddr::from(([0, 0, 0, 0], 3030)));
        assert_eq!(bind_addr(None, Some("8080")).port(), 8080);
        assert_eq!(
            bind_addr(Some("127.0.0.1:9000"), Some("8080")),
            SocketAddr::from(([127, 0, 0, 1], 9000))
        );
        assert_eq!(bind_addr(Some("garbage"), Some("x")).port(), 3030);
    }
}
