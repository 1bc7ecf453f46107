// json_store.rs — JSONL file-backed DocumentStore.
//
// One document per line in a single `.jsonl` file, loaded at open and
// rewritten on every mutation. The file is the durable state: reopening a
// store over the same path restores every in-flight application exactly
// where its user left off, which is what makes a process restart harmless.
//
// Plugin-scale volumes only (one document per position, one per
// applicant, one settings singleton). Swap the trait implementation for a
// real database when that stops being true.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::store::{matches, Document, DocumentStore, StoreError};

/// JSON Lines file-based document store.
pub struct JsonFileStore {
    path: PathBuf,
    documents: Mutex<Vec<Document>>,
}

impl JsonFileStore {
    /// Open a store backed by the given file, creating parent directories
    /// as needed. Loads any existing documents.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let documents = if path.exists() {
            let file = File::open(&path).map_err(|source| StoreError::Io {
                path: path.display().to_string(),
                source,
            })?;
            let reader = BufReader::new(file);
            let mut documents = Vec::new();
            for line in reader.lines() {
                let line = line.map_err(|source| StoreError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                if line.trim().is_empty() {
                    continue;
                }
                documents.push(serde_json::from_str(&line)?);
            }
            documents
        } else {
            Vec::new()
        };

        Ok(Self {
            path,
            documents: Mutex::new(documents),
        })
    }

    /// Rewrite the whole file from the in-memory view.
    fn persist(&self, documents: &[Document]) -> Result<(), StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|source| StoreError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        let mut writer = BufWriter::new(file);
        for document in documents {
            let json = serde_json::to_string(document)?;
            writeln!(writer, "{}", json).map_err(|source| StoreError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        }
        writer.flush().map_err(|source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn find_one(&self, filter: &Document) -> Result<Option<Document>, StoreError> {
        let documents = self.documents.lock().await;
        Ok(documents.iter().find(|d| matches(d, filter)).cloned())
    }

    async fn find_all(&self, filter: &Document) -> Result<Vec<Document>, StoreError> {
        let documents = self.documents.lock().await;
        Ok(documents
            .iter()
            .filter(|d| matches(d, filter))
            .cloned()
            .collect())
    }

    async fn insert_one(&self, doc: Document) -> Result<(), StoreError> {
        let mut documents = self.documents.lock().await;
        documents.push(doc);
        self.persist(&documents)
    }

    async fn update_one(&self, filter: &Document, set: Document) -> Result<bool, StoreError> {
        let mut documents = self.documents.lock().await;
        let Some(target) = documents.iter_mut().find(|d| matches(d, filter)) else {
            return Ok(false);
        };
        for (key, value) in set {
            target.insert(key, value);
        }
        self.persist(&documents)?;
        Ok(true)
    }

    async fn delete_one(&self, filter: &Document) -> Result<Option<Document>, StoreError> {
        let mut documents = self.documents.lock().await;
        let Some(index) = documents.iter().position(|d| matches(d, filter)) else {
            return Ok(None);
        };
        let removed = documents.remove(index);
        self.persist(&documents)?;
        Ok(Some(removed))
    }
}
