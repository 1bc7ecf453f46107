// record.rs — ApplicationRecord and its typed store adapter.
//
// One record per application, keyed by user. `in_progress` is the status
// bit: at most one in-progress record may exist per user at any instant
// (the workflow's per-user lock upholds this across suspension points).
// Records are never hard-deleted; a closed record is inert history.
//
// The adapter hides field-by-field mutation: the rest of the system speaks
// in named operations (assign_position, save_remaining, close_by_user)
// rather than ad-hoc document updates.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::identity::{ChannelId, UserId};
use crate::position::Position;
use crate::questions::QuestionSet;
use crate::store::{doc, from_document, to_document, DocumentStore, StoreError};

/// One user's in-flight or historical application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    /// The applicant.
    pub user_id: UserId,
    /// Status bit: true while the application is open.
    pub in_progress: bool,
    /// The private channel created for this application.
    pub channel_id: ChannelId,
    /// Chosen position name, absent until selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_position: Option<String>,
    /// Question count snapshot taken at selection, for "N of M" display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<u32>,
    /// Shrinking questionnaire cursor; empty means every question has been
    /// asked. Absent until a position is selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_questions: Option<QuestionSet>,
}

impl ApplicationRecord {
    /// A fresh record: in progress, no position chosen yet.
    pub fn new(user_id: UserId, channel_id: ChannelId) -> Self {
        Self {
            user_id,
            in_progress: true,
            channel_id,
            selected_position: None,
            total_questions: None,
            remaining_questions: None,
        }
    }

    /// Where this application stands, derived from the persisted fields.
    pub fn phase(&self) -> ApplicationPhase {
        if !self.in_progress {
            ApplicationPhase::Closed
        } else if self.selected_position.is_none() {
            ApplicationPhase::AwaitingPositionChoice
        } else if self
            .remaining_questions
            .as_ref()
            .is_some_and(|q| !q.is_empty())
        {
            ApplicationPhase::AnsweringQuestions
        } else {
            ApplicationPhase::Complete
        }
    }
}

/// Lifecycle phase of an application. Not persisted; derived from the
/// record so a restart cannot disagree with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationPhase {
    /// Open, waiting for the user to pick a position.
    AwaitingPositionChoice,
    /// Position chosen, questions remain.
    AnsweringQuestions,
    /// Every question asked; open until staff close it.
    Complete,
    /// Closed by staff or by the applicant.
    Closed,
}

impl fmt::Display for ApplicationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationPhase::AwaitingPositionChoice => write!(f, "awaiting_position_choice"),
            ApplicationPhase::AnsweringQuestions => write!(f, "answering_questions"),
            ApplicationPhase::Complete => write!(f, "complete"),
            ApplicationPhase::Closed => write!(f, "closed"),
        }
    }
}

/// Typed accessor over the document store for application records.
pub struct ApplicationStore {
    store: Arc<dyn DocumentStore>,
}

impl ApplicationStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Insert a fresh in-progress record.
    pub async fn insert_new(
        &self,
        user: &UserId,
        channel: &ChannelId,
    ) -> Result<ApplicationRecord, StoreError> {
        let record = ApplicationRecord::new(user.clone(), channel.clone());
        self.store.insert_one(to_document(&record)?).await?;
        Ok(record)
    }

    /// The user's in-progress record, if any.
    pub async fn find_in_progress_by_user(
        &self,
        user: &UserId,
    ) -> Result<Option<ApplicationRecord>, StoreError> {
        self.decode(
            self.store
                .find_one(&doc([
                    ("userId", json!(user)),
                    ("inProgress", json!(true)),
                ]))
                .await?,
        )
    }

    /// The in-progress record bound to a channel, if any.
    pub async fn find_in_progress_by_channel(
        &self,
        channel: &ChannelId,
    ) -> Result<Option<ApplicationRecord>, StoreError> {
        self.decode(
            self.store
                .find_one(&doc([
                    ("channelId", json!(channel)),
                    ("inProgress", json!(true)),
                ]))
                .await?,
        )
    }

    /// The in-progress record scoped to both user and channel.
    pub async fn find_in_progress(
        &self,
        user: &UserId,
        channel: &ChannelId,
    ) -> Result<Option<ApplicationRecord>, StoreError> {
        self.decode(
            self.store
                .find_one(&doc([
                    ("userId", json!(user)),
                    ("inProgress", json!(true)),
                    ("channelId", json!(channel)),
                ]))
                .await?,
        )
    }

    /// Record the position selection in one update: name, question-count
    /// snapshot, and the remaining-questions cursor.
    pub async fn assign_position(
        &self,
        user: &UserId,
        position: &Position,
        remaining: &QuestionSet,
    ) -> Result<(), StoreError> {
        self.store
            .update_one(
                &doc([("userId", json!(user)), ("inProgress", json!(true))]),
                doc([
                    ("selectedPosition", json!(position.name)),
                    ("totalQuestions", json!(position.questions.len() as u32)),
                    ("remainingQuestions", serde_json::to_value(remaining)?),
                ]),
            )
            .await?;
        Ok(())
    }

    /// Persist the shrunk questionnaire cursor.
    pub async fn save_remaining(
        &self,
        user: &UserId,
        remaining: &QuestionSet,
    ) -> Result<(), StoreError> {
        self.store
            .update_one(
                &doc([("userId", json!(user)), ("inProgress", json!(true))]),
                doc([("remainingQuestions", serde_json::to_value(remaining)?)]),
            )
            .await?;
        Ok(())
    }

    /// Close the user's in-progress record. Returns whether one matched.
    pub async fn close_by_user(&self, user: &UserId) -> Result<bool, StoreError> {
        self.store
            .update_one(
                &doc([("userId", json!(user)), ("inProgress", json!(true))]),
                doc([("inProgress", json!(false))]),
            )
            .await
    }

    /// Close the in-progress record bound to a channel. Returns whether one
    /// matched.
    pub async fn close_by_channel(&self, channel: &ChannelId) -> Result<bool, StoreError> {
        self.store
            .update_one(
                &doc([("channelId", json!(channel)), ("inProgress", json!(true))]),
                doc([("inProgress", json!(false))]),
            )
            .await
    }

    fn decode(
        &self,
        found: Option<crate::store::Document>,
    ) -> Result<Option<ApplicationRecord>, StoreError> {
        match found {
            Some(document) => Ok(Some(from_document(document)?)),
            None => Ok(None),
        }
    }
}
