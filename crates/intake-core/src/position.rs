// position.rs — Position definitions and the PositionCatalog.
//
// A Position is a hiring role: a display name, the channel group an
// applicant's channel moves to once they choose it, and the ordered
// questions they will be asked. The catalog is pure document-store CRUD
// (no chat-platform calls), keyed by the case-folded name so lookups are
// case-insensitive.
//
// Positions are edited by delete + recreate; there is no in-place edit.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::WorkflowError;
use crate::identity::GroupId;
use crate::questions::QuestionSet;
use crate::store::{doc, from_document, to_document, DocumentStore};

/// A configured hiring role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Display name, unique case-insensitively.
    pub name: String,
    /// Case-folded lookup key, persisted alongside the display name.
    pub lowered_name: String,
    /// Channel group the applicant's channel relocates to on selection.
    pub destination_group: GroupId,
    /// Ordered questionnaire, numbered 1..N.
    pub questions: QuestionSet,
}

impl Position {
    /// Build a position, assigning sequence numbers 1..N in list order.
    pub fn new(name: impl Into<String>, destination_group: GroupId, questions: Vec<String>) -> Self {
        let name = name.into();
        Self {
            lowered_name: name.to_lowercase(),
            name,
            destination_group,
            questions: QuestionSet::from_texts(questions),
        }
    }
}

/// Marker distinguishing position documents in the shared collection.
fn position_marker() -> (&'static str, Value) {
    ("isPosition", json!(true))
}

/// CRUD over position definitions.
pub struct PositionCatalog {
    store: Arc<dyn DocumentStore>,
}

impl PositionCatalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a new position. Fails with `DuplicateName` when a position
    /// with the same case-folded name exists, and `EmptyQuestionList` when
    /// no questions are given.
    pub async fn create(
        &self,
        name: &str,
        destination_group: GroupId,
        questions: Vec<String>,
    ) -> Result<Position, WorkflowError> {
        if questions.is_empty() {
            return Err(WorkflowError::EmptyQuestionList);
        }

        let position = Position::new(name, destination_group, questions);
        let existing = self
            .store
            .find_one(&doc([
                position_marker(),
                ("loweredName", json!(position.lowered_name)),
            ]))
            .await?;
        if existing.is_some() {
            return Err(WorkflowError::DuplicateName(position.name));
        }

        let mut document = to_document(&position)?;
        let (marker, value) = position_marker();
        document.insert(marker.to_string(), value);
        self.store.insert_one(document).await?;

        tracing::info!(
            "position {:?} created with {} questions",
            position.name,
            position.questions.len()
        );
        Ok(position)
    }

    /// Look up a position by name, case-insensitively.
    pub async fn find(&self, name: &str) -> Result<Option<Position>, WorkflowError> {
        let found = self
            .store
            .find_one(&doc([
                position_marker(),
                ("loweredName", json!(name.to_lowercase())),
            ]))
            .await?;
        match found {
            Some(document) => Ok(Some(from_document(document)?)),
            None => Ok(None),
        }
    }

    /// All positions, in insertion order. Callers sort by display name for
    /// presentation.
    pub async fn list(&self) -> Result<Vec<Position>, WorkflowError> {
        let documents = self.store.find_all(&doc([position_marker()])).await?;
        documents
            .into_iter()
            .map(|document| Ok(from_document::<Position>(document)?))
            .collect()
    }

    /// Display names of all positions.
    pub async fn names(&self) -> Result<Vec<String>, WorkflowError> {
        Ok(self.list().await?.into_iter().map(|p| p.name).collect())
    }

    /// Delete a position by name. Returns the deleted position, or
    /// `PositionNotFound` (without suggestions; this is the admin path).
    pub async fn delete(&self, name: &str) -> Result<Position, WorkflowError> {
        let deleted = self
            .store
            .delete_one(&doc([
                position_marker(),
                ("loweredName", json!(name.to_lowercase())),
            ]))
            .await?;
        match deleted {
            Some(document) => {
                let position: Position = from_document(document)?;
                tracing::info!("position {:?} deleted", position.name);
                Ok(position)
            }
            None => Err(WorkflowError::PositionNotFound {
                input: name.to_string(),
                suggestions: Vec::new(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;

    fn catalog() -> PositionCatalog {
        PositionCatalog::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn create_assigns_sequence_numbers_in_order() {
        let catalog = catalog();
        let position = catalog
            .create(
                "Moderator",
                GroupId::from("grp-1"),
                vec!["Why?".to_string(), "How old?".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(position.questions.get(1), Some("Why?"));
        assert_eq!(position.questions.get(2), Some("How old?"));
        assert_eq!(position.lowered_name, "moderator");
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected_case_insensitively() {
        let catalog = catalog();
        catalog
            .create("Moderator", GroupId::from("grp-1"), vec!["Why?".to_string()])
            .await
            .unwrap();

        let result = catalog
            .create("MODERATOR", GroupId::from("grp-2"), vec!["Why?".to_string()])
            .await;
        assert!(matches!(result, Err(WorkflowError::DuplicateName(_))));
    }

    #[tokio::test]
    async fn create_rejects_empty_question_list() {
        let catalog = catalog();
        let result = catalog
            .create("Moderator", GroupId::from("grp-1"), Vec::new())
            .await;
        assert!(matches!(result, Err(WorkflowError::EmptyQuestionList)));
    }

    #[tokio::test]
    async fn find_is_case_insensitive() {
        let catalog = catalog();
        catalog
            .create("Moderator", GroupId::from("grp-1"), vec!["Why?".to_string()])
            .await
            .unwrap();

        let found = catalog.find("mOdErAtOr").await.unwrap();
        assert_eq!(found.map(|p| p.name), Some("Moderator".to_string()));
    }

    #[tokio::test]
    async fn delete_returns_the_removed_position() {
        let catalog = catalog();
        catalog
            .create("Partner", GroupId::from("grp-9"), vec!["Coolness?".to_string()])
            .await
            .unwrap();

        let deleted = catalog.delete("partner").await.unwrap();
        assert_eq!(deleted.name, "Partner");
        assert!(catalog.find("Partner").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_missing_position_fails_without_suggestions() {
        let catalog = catalog();
        let result = catalog.delete("ghost").await;
        match result {
            Err(WorkflowError::PositionNotFound { suggestions, .. }) => {
                assert!(suggestions.is_empty());
            }
            other => panic!("expected PositionNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_returns_all_positions() {
        let catalog = catalog();
        for name in ["Moderator", "Partner", "Admin"] {
            catalog
                .create(name, GroupId::from("grp"), vec!["Q".to_string()])
                .await
                .unwrap();
        }
        assert_eq!(catalog.list().await.unwrap().len(), 3);
        assert_eq!(catalog.names().await.unwrap().len(), 3);
    }
}
