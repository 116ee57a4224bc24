//! Persistence of named canvases.

mod autosave;
mod memory;
mod rest;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use autosave::{AutoSaver, SaveRequest, send_save};
pub use memory::MemoryStore;
pub use rest::RestStore;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Canvas not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A named canvas as the persistence collaborator stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub title: String,
    /// Persisted document in any accepted dialect.
    #[serde(default)]
    pub data: Value,
}

impl CanvasRecord {
    pub fn new(id: impl Into<String>, project_id: Option<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            project_id,
            title: title.into(),
            data: Value::Null,
        }
    }
}

/// Body of `POST /canvases`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCanvas {
    pub project_id: String,
    pub title: String,
}

/// Body of `PUT /canvases/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasData {
    pub data: Value,
}

/// Backend for named canvases.
///
/// `put` overwrites the whole document, so concurrent writers resolve as
/// last-write-wins.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait CanvasStore: Send + Sync {
    fn get(&self, id: &str) -> BoxFuture<'_, StorageResult<CanvasRecord>>;

    fn put(&self, id: &str, data: Value) -> BoxFuture<'_, StorageResult<()>>;

    fn create(&self, project_id: &str, title: &str) -> BoxFuture<'_, StorageResult<CanvasRecord>>;

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Ids of all stored canvases.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;
}

/// Backend for named canvases (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait CanvasStore {
    fn get(&self, id: &str) -> BoxFuture<'_, StorageResult<CanvasRecord>>;

    fn put(&self, id: &str, data: Value) -> BoxFuture<'_, StorageResult<()>>;

    fn create(&self, project_id: &str, title: &str) -> BoxFuture<'_, StorageResult<CanvasRecord>>;

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;
}
