// memory_store.rs — In-memory DocumentStore backend.
//
// Backs the test suite and any embedder that wants workflow semantics
// without durability. Documents live in a Vec behind an async mutex, so
// each store operation is atomic with respect to concurrent tasks.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::store::{matches, Document, DocumentStore, StoreError};

/// Volatile document store. Insertion order is preserved.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents (diagnostics and tests).
    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.lock().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
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
        self.documents.lock().await.push(doc);
        Ok(())
    }

    async fn update_one(&self, filter: &Document, set: Document) -> Result<bool, StoreError> {
        let mut documents = self.documents.lock().await;
        match documents.iter_mut().find(|d| matches(d, filter)) {
            Some(target) => {
                for (key, value) in set {
                    target.insert(key, value);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_one(&self, filter: &Document) -> Result<Option<Document>, StoreError> {
        let mut documents = self.documents.lock().await;
        match documents.iter().position(|d| matches(d, filter)) {
            Some(index) => Ok(Some(documents.remove(index))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::doc;
    use serde_json::json;

    #[tokio::test]
    async fn insert_then_find_one() {
        let store = MemoryStore::new();
        store
            .insert_one(doc([("name", json!("Moderator"))]))
            .await
            .unwrap();

        let found = store
            .find_one(&doc([("name", json!("Moderator"))]))
            .await
            .unwrap();
        assert!(found.is_some());

        let missing = store
            .find_one(&doc([("name", json!("Admin"))]))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn find_all_preserves_insertion_order() {
        let store = MemoryStore::new();
        for name in ["a", "b", "c"] {
            store
                .insert_one(doc([("kind", json!("x")), ("name", json!(name))]))
                .await
                .unwrap();
        }

        let all = store.find_all(&doc([("kind", json!("x"))])).await.unwrap();
        let names: Vec<_> = all.iter().map(|d| d["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn update_one_merges_fields_into_first_match() {
        let store = MemoryStore::new();
        store
            .insert_one(doc([("userId", json!("u-1")), ("inProgress", json!(true))]))
            .await
            .unwrap();

        let matched = store
            .update_one(
                &doc([("userId", json!("u-1"))]),
                doc([("inProgress", json!(false)), ("note", json!("closed"))]),
            )
            .await
            .unwrap();
        assert!(matched);

        let updated = store
            .find_one(&doc([("userId", json!("u-1"))]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["inProgress"], json!(false));
        assert_eq!(updated["note"], json!("closed"));
    }

    #[tokio::test]
    async fn update_one_reports_no_match() {
        let store = MemoryStore::new();
        let matched = store
            .update_one(&doc([("userId", json!("ghost"))]), doc([("x", json!(1))]))
            .await
            .unwrap();
        assert!(!matched);
    }

    #[tokio::test]
    async fn delete_one_removes_and_returns_document() {
        let store = MemoryStore::new();
        store
            .insert_one(doc([("name", json!("Moderator"))]))
            .await
            .unwrap();

        let deleted = store
            .delete_one(&doc([("name", json!("Moderator"))]))
            .await
            .unwrap();
        assert!(deleted.is_some());
        assert_eq!(store.len().await, 0);

        let again = store
            .delete_one(&doc([("name", json!("Moderator"))]))
            .await
            .unwrap();
        assert!(again.is_none());
    }
}
