use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Host-provided key/value persistence for the plugin's data object.
pub trait PersistenceStore {
    /// `Ok(None)` when nothing has been saved yet.
    fn load_data(&self) -> Result<Option<Value>, PersistenceError>;
    fn save_data(&mut self, data: &Value) -> Result<(), PersistenceError>;
}

/// Stores the data object as pretty JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistenceStore for JsonFileStore {
    fn load_data(&self) -> Result<Option<Value>, PersistenceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|source| io_error(&self.path, source))?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save_data(&mut self, data: &Value) -> Result<(), PersistenceError> {
        let payload = serde_json::to_string_pretty(data)?;
        write_atomic(&self.path, &payload)
    }
}

fn write_atomic(path: &Path, payload: &str) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
        }
    }

    let temp_path = match path.file_name() {
        Some(name) => path.with_file_name(format!("{}.tmp", name.to_string_lossy())),
        None => path.with_extension("tmp"),
    };

    std::fs::write(&temp_path, payload).map_err(|source| io_error(&temp_path, source))?;
    std::fs::rename(&temp_path, path).map_err(|source| io_error(path, source))?;
    Ok(())
}

fn io_error(path: &Path, source: std::io::Error) -> PersistenceError {
    PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Keeps the data object in memory. Used when no data file is configured.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Option<Value>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: Value) -> Self {
        Self {
            data: Some(data),
            saves: 0,
        }
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl PersistenceStore for MemoryStore {
    fn load_data(&self) -> Result<Option<Value>, PersistenceError> {
        Ok(self.data.clone())
    }

    fn save_data(&mut self, data: &Value) -> Result<(), PersistenceError> {
        self.data = Some(data.clone());
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("data.json"));
        assert!(store.load_data().expect("load").is_none());
    }

    #[test]
    fn blank_file_loads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data.json");
        std::fs::write(&path, "  \n").expect("write");
        let store = JsonFileStore::new(path);
        assert!(store.load_data().expect("load").is_none());
    }

    #[test]
    fn save_creates_parent_dirs_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/plugin/data.json");
        let mut store = JsonFileStore::new(&path);
        store
            .save_data(&json!({"adviceScope": "poetry"}))
            .expect("save");

        assert!(path.exists());
        assert!(!dir.path().join("nested/plugin/data.json.tmp").exists());
        let loaded = store.load_data().expect("load").expect("some data");
        assert_eq!(loaded["adviceScope"], "poetry");
    }

    #[test]
    fn malformed_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{not json").expect("write");
        let store = JsonFileStore::new(path);
        assert!(matches!(
            store.load_data(),
            Err(PersistenceError::Serialization(_))
        ));
    }

    #[test]
    fn memory_store_counts_saves() {
        let mut store = MemoryStore::new();
        store.save_data(&json!({})).expect("save");
        store.save_data(&json!({"claudeApiKey": "k"})).expect("save");
        assert_eq!(store.saves(), 2);
        assert_eq!(store.data().expect("data")["claudeApiKey"], "k");
    }
}
