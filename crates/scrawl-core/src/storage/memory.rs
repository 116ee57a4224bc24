//! In-memory canvas store.

use super::{BoxFuture, CanvasRecord, CanvasStore, StorageError, StorageResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

/// In-memory store for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, CanvasRecord>>,
    writes: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly.
    pub fn insert(&self, record: CanvasRecord) -> StorageResult<()> {
        let mut records = self.records.write().map_err(lock_error)?;
        records.insert(record.id.clone(), record);
        Ok(())
    }

    /// Make every subsequent `put` fail, to exercise save failures.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successful `put` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl CanvasStore for MemoryStore {
    fn get(&self, id: &str) -> BoxFuture<'_, StorageResult<CanvasRecord>> {
        let id = id.to_string();
        Box::pin(async move {
            let records = self.records.read().map_err(lock_error)?;
            records.get(&id).cloned().ok_or(StorageError::NotFound(id))
        })
    }

    fn put(&self, id: &str, data: Value) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StorageError::Other("store unavailable".to_string()));
            }
            let mut records = self.records.write().map_err(lock_error)?;
            let record = records.get_mut(&id).ok_or(StorageError::NotFound(id))?;
            record.data = data;
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn create(&self, project_id: &str, title: &str) -> BoxFuture<'_, StorageResult<CanvasRecord>> {
        let record = CanvasRecord::new(
            uuid::Uuid::new_v4().to_string(),
            Some(project_id.to_string()),
            title,
        );
        Box::pin(async move {
            let mut records = self.records.write().map_err(lock_error)?;
            records.insert(record.id.clone(), record.clone());
            Ok(record)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut records = self.records.write().map_err(lock_error)?;
            records.remove(&id).map(|_| ()).ok_or(StorageError::NotFound(id))
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let records = self.records.read().map_err(lock_error)?;
            let mut ids = records.keys().cloned().collect::<Vec<_>>();
            ids.sort();
            Ok(ids)
        })
    }
}
