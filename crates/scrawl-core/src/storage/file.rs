//! File-based canvas store for native platforms.

use super::{BoxFuture, CanvasRecord, CanvasStore, StorageError, StorageResult};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each canvas record as `<id>.json` in a directory.
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Store in the platform data directory.
    ///
    /// On Unix: `~/.local/share/scrawl/canvases/`
    /// On Windows: `%LOCALAPPDATA%\scrawl\canvases\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("scrawl").join("canvases"))
    }

    fn record_path(&self, id: &str) -> PathBuf {
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn read_record(path: &Path, id: &str) -> StorageResult<CanvasRecord> {
        if !path.exists() {
            return Err(StorageError::NotFound(id.to_string()));
        }
        let json = fs::read_to_string(path)
            .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&json).map_err(|e| {
            StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    fn write_record(path: &Path, record: &CanvasRecord) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(record)?;
        fs::write(path, json)
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }
}

impl CanvasStore for FileStore {
    fn get(&self, id: &str) -> BoxFuture<'_, StorageResult<CanvasRecord>> {
        let path = self.record_path(id);
        let id = id.to_string();
        Box::pin(async move { Self::read_record(&path, &id) })
    }

    fn put(&self, id: &str, data: Value) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.record_path(id);
        let id = id.to_string();
        Box::pin(async move {
            let mut record = Self::read_record(&path, &id)?;
            record.data = data;
            Self::write_record(&path, &record)
        })
    }

    fn create(&self, project_id: &str, title: &str) -> BoxFuture<'_, StorageResult<CanvasRecord>> {
        let record = CanvasRecord::new(
            uuid::Uuid::new_v4().to_string(),
            Some(project_id.to_string()),
            title,
        );
        let path = self.record_path(&record.id);
        Box::pin(async move {
            Self::write_record(&path, &record)?;
            Ok(record)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.record_path(id);
        let id = id.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(id));
            }
            fs::remove_file(&path)
                .map_err(|e| StorageError::Io(format!("Failed to delete {}: {}", path.display(), e)))
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }
            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;
            let mut ids = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|e| e == "json"))
                .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
                .collect::<Vec<_>>();
            ids.sort();
            Ok(ids)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_create_put_get() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        let record = block_on(store.create("p", "Market map")).unwrap();
        block_on(store.put(&record.id, json!({"elements": [], "appState": {}}))).unwrap();

        let loaded = block_on(store.get(&record.id)).unwrap();
        assert_eq!(loaded.title, "Market map");
        assert_eq!(loaded.data["elements"], json!([]));
    }

    #[test]
    fn test_not_found() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        assert!(matches!(
            block_on(store.get("nonexistent")),
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            block_on(store.put("nonexistent", Value::Null)),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_and_delete() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        let a = block_on(store.create("p", "a")).unwrap();
        let b = block_on(store.create("p", "b")).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let list = block_on(store.list()).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.contains(&a.id) && list.contains(&b.id));

        block_on(store.delete(&a.id)).unwrap();
        assert_eq!(block_on(store.list()).unwrap(), vec![b.id]);
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("deep").join("canvases");
        let store = FileStore::new(nested.clone()).unwrap();
        assert!(nested.exists());
        assert_eq!(store.base_path(), nested.as_path());
    }
}
