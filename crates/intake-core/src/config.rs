// config.rs — Workflow settings persisted as a singleton document.
//
// The only setting today is the main category: the channel group new
// application channels are created under. It lives in the store (not a
// config file) because admins set it from chat at runtime.

use std::sync::Arc;

use serde_json::json;

use crate::error::WorkflowError;
use crate::identity::GroupId;
use crate::store::{doc, Document, DocumentStore};

const CONFIG_ID: &str = "config";

/// Accessor for the settings singleton (`_id = "config"`).
pub struct Settings {
    store: Arc<dyn DocumentStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// The channel group new application channels are created under.
    /// `None` until an admin configures it.
    pub async fn main_category(&self) -> Result<Option<GroupId>, WorkflowError> {
        let found = self
            .store
            .find_one(&doc([("_id", json!(CONFIG_ID))]))
            .await?;
        Ok(found
            .as_ref()
            .and_then(|config| config.get("mainCategory"))
            .and_then(|value| value.as_str())
            .map(GroupId::from))
    }

    /// Set the main category, creating the singleton on first use.
    pub async fn set_main_category(&self, group: &GroupId) -> Result<(), WorkflowError> {
        let filter = doc([("_id", json!(CONFIG_ID))]);
        let set = doc([("mainCategory", json!(group))]);
        if !self.store.update_one(&filter, set).await? {
            let mut document = Document::new();
            document.insert("_id".to_string(), json!(CONFIG_ID));
            document.insert("mainCategory".to_string(), json!(group));
            self.store.insert_one(document).await?;
        }
        tracing::info!("main category set to {}", group);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;

    #[tokio::test]
    async fn unset_main_category_is_none() {
        let settings = Settings::new(Arc::new(MemoryStore::new()));
        assert!(settings.main_category().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let settings = Settings::new(Arc::new(MemoryStore::new()));
        settings
            .set_main_category(&GroupId::from("grp-main"))
            .await
            .unwrap();
        assert_eq!(
            settings.main_category().await.unwrap(),
            Some(GroupId::from("grp-main"))
        );
    }

    #[tokio::test]
    async fn set_overwrites_existing_value() {
        let store = Arc::new(MemoryStore::new());
        let settings = Settings::new(Arc::clone(&store) as Arc<dyn DocumentStore>);
        settings
            .set_main_category(&GroupId::from("grp-old"))
            .await
            .unwrap();
        settings
            .set_main_category(&GroupId::from("grp-new"))
            .await
            .unwrap();

        assert_eq!(
            settings.main_category().await.unwrap(),
            Some(GroupId::from("grp-new"))
        );
        // Still a singleton.
        assert_eq!(store.len().await, 1);
    }
}
