// store.rs — DocumentStore: the abstract persistence collaborator.
//
// The workflow persists positions, application records, and settings as
// schemaless JSON documents in a single logical collection, the way a
// document database partition would hold them. The trait is the narrow
// waist: find/insert/update/delete-one, with filters matched by field
// equality. Typed adapters (PositionCatalog, ApplicationStore, Settings)
// sit on top and hide field-by-field mutation from the rest of the system.
//
// Every call is an async suspension point: between a read and a write,
// another task may run. The workflow layer is responsible for per-user
// mutual exclusion (see workflow.rs); the store itself only guarantees
// that each single operation is applied atomically.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// A schemaless persisted document.
pub type Document = Map<String, Value>;

/// Errors surfaced by document store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A file I/O operation failed (file-backed stores).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Failed to serialize or deserialize a document.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-specific failure (connectivity, corruption).
    #[error("store backend error: {0}")]
    Backend(String),
}

/// The document store contract.
///
/// Filters are themselves documents: a candidate matches when every filter
/// field is present with an equal value. That equality-conjunction subset
/// is all the workflow ever needs.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Return the first document matching `filter`, if any.
    async fn find_one(&self, filter: &Document) -> Result<Option<Document>, StoreError>;

    /// Return all documents matching `filter`, in insertion order.
    async fn find_all(&self, filter: &Document) -> Result<Vec<Document>, StoreError>;

    /// Append a new document.
    async fn insert_one(&self, doc: Document) -> Result<(), StoreError>;

    /// Merge the fields of `set` into the first document matching `filter`.
    /// Returns whether a document matched.
    async fn update_one(&self, filter: &Document, set: Document) -> Result<bool, StoreError>;

    /// Remove and return the first document matching `filter`.
    async fn delete_one(&self, filter: &Document) -> Result<Option<Document>, StoreError>;
}

/// Field-equality match: every filter entry must appear in `doc` unchanged.
pub fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, value)| doc.get(key) == Some(value))
}

/// Build a document from key/value pairs.
pub fn doc<I>(entries: I) -> Document
where
    I: IntoIterator<Item = (&'static str, Value)>,
{
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Serialize a typed value into a document.
pub fn to_document<T: serde::Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(doc) => Ok(doc),
        other => Err(StoreError::Backend(format!(
            "expected an object document, got {other}"
        ))),
    }
}

/// Deserialize a document into a typed value. Unknown fields (such as the
/// `isPosition` marker) are ignored.
pub fn from_document<T: serde::de::DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}
