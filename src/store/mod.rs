//! @ai:module:intent Persistence of per-item benchmark records
//! @ai:module:layer infrastructure
//! @ai:module:public_api RecordStore, MemoryRecordStore, JsonlRecordStore, RecordWriter, BenchmarkRecord

pub mod record;
pub mod writer;

pub use record::{normalize_all, BenchmarkRecord, MemorySnapshot, StoredRecord};
pub use writer::{spawn_writer, PersistenceReport, RecordSink};

use crate::error::{Error, Result};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// @ai:intent Append-only document store for benchmark records
pub trait RecordStore: Send + Sync {
    /// @ai:intent Append one document
    fn append(&self, record: &StoredRecord) -> Result<()>;

    /// @ai:intent Read every stored document in insertion order
    fn load_all(&self) -> Result<Vec<StoredRecord>>;
}

/// @ai:intent In-memory store used by tests and dry runs
#[derive(Default)]
pub struct MemoryRecordStore {
    documents: Mutex<Vec<StoredRecord>>,
}

impl MemoryRecordStore {
    /// @ai:intent Create an empty in-memory store
    /// @ai:effects pure
    pub fn new() -> Self {
        Self::default()
    }

    /// @ai:intent Create a store pre-filled with documents
    /// @ai:effects pure
    pub fn with_documents(documents: Vec<StoredRecord>) -> Self {
        Self {
            documents: Mutex::new(documents),
        }
    }

    fn poisoned() -> Error {
        Error::StoreUnavailable("memory store lock poisoned".to_string())
    }
}

impl RecordStore for MemoryRecordStore {
    fn append(&self, record: &StoredRecord) -> Result<()> {
        self.documents
            .lock()
            .map_err(|_| Self::poisoned())?
            .push(record.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<StoredRecord>> {
        Ok(self.documents.lock().map_err(|_| Self::poisoned())?.clone())
    }
}

/// @ai:intent File-backed store holding one JSON document per line
pub struct JsonlRecordStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlRecordStore {
    /// @ai:intent Open (or lazily create) a JSON-lines store
    /// @ai:effects pure
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// @ai:intent Location of the backing file
    /// @ai:effects pure
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for JsonlRecordStore {
    /// @ai:effects fs:write
    fn append(&self, record: &StoredRecord) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| Error::StoreUnavailable(self.path.display().to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::file_access(parent, e))?;
        }

        let line = serde_json::to_string(record)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::file_access(&self.path, e))?;

        writeln!(file, "{}", line).map_err(|e| Error::file_access(&self.path, e))?;
        Ok(())
    }

    /// @ai:effects fs:read
    fn load_all(&self) -> Result<Vec<StoredRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = std::fs::File::open(&self.path).map_err(|e| Error::file_access(&self.path, e))?;
        let mut documents = Vec::new();

        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| Error::file_access(&self.path, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let document = serde_json::from_str(&line).map_err(|source| Error::MalformedRecord {
                path: self.path.clone(),
                line: index + 1,
                source,
            })?;
            documents.push(document);
        }

        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn document(model: &str, id: &str) -> StoredRecord {
        StoredRecord {
            model_name: Some(model.to_string()),
            data_id: Some(id.to_string()),
            latency_ms: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_memory_store_append_and_load() {
        let store = MemoryRecordStore::new();
        store.append(&document("a", "1")).unwrap();
        store.append(&document("b", "2")).unwrap();

        let docs = store.load_all().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].model_name.as_deref(), Some("b"));
    }

    #[test]
    fn test_jsonl_store_roundtrip() {
        let temp = TempDir::new().unwrap();
        let store = JsonlRecordStore::new(temp.path().join("nested").join("records.jsonl"));

        store.append(&document("a", "1")).unwrap();
        store.append(&document("a", "2")).unwrap();

        let docs = store.load_all().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0], document("a", "1"));
    }

    #[test]
    fn test_jsonl_store_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = JsonlRecordStore::new(temp.path().join("none.jsonl"));
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_jsonl_store_reports_malformed_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("records.jsonl");
        std::fs::write(&path, "{\"modelName\":\"a\"}\nnot json\n").unwrap();

        let err = JsonlRecordStore::new(&path).load_all().unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { line: 2, .. }));
    }
}
