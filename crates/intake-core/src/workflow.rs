// workflow.rs — ApplicationWorkflow: the application state machine.
//
// Drives one application through its lifecycle:
//
//   NoApplication → AwaitingPositionChoice → AnsweringQuestions
//     → Complete → Closed
//
// NoApplication is the implicit absence of an in-progress record; Complete
// and Closed are both terminal for question flow, but only Closed frees the
// user to start again. Completion is advisory; the record stays in
// progress until staff close it.
//
// Every call into the store or the chat host is a suspension point, so a
// user's own commands could interleave between a read and a write. Each
// mutating operation therefore holds that user's lock for its full
// duration; commands from different users interleave freely.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;

use crate::channel::{ChannelLifecycleManager, ChatHost};
use crate::config::Settings;
use crate::error::WorkflowError;
use crate::fuzzy::closest_matches;
use crate::identity::{Applicant, ChannelId, UserId};
use crate::position::{Position, PositionCatalog};
use crate::record::{ApplicationRecord, ApplicationStore};
use crate::store::DocumentStore;

/// A question ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPrompt {
    /// 1-based position in the questionnaire ("Question {number} ...").
    pub number: u32,
    /// Snapshot question count ("... out of {total}").
    pub total: u32,
    /// Question text, newline escapes already unescaped.
    pub text: String,
}

/// Result of an `advance` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The next unanswered question.
    Question(QuestionPrompt),
    /// Every question has been asked. Repeated calls keep returning this
    /// without mutating anything.
    Complete,
}

/// Result of a successful `start`.
#[derive(Debug, Clone)]
pub struct ApplicationStarted {
    pub record: ApplicationRecord,
    pub channel_id: ChannelId,
    /// Position names for the choice prompt, sorted for display.
    pub position_names: Vec<String>,
}

/// Result of a successful `choose_position`.
#[derive(Debug, Clone)]
pub struct PositionChosen {
    pub position: Position,
    /// Question 1, surfaced eagerly with the selection itself.
    pub first_question: QuestionPrompt,
}

/// Whose application a `close` targets.
#[derive(Debug, Clone)]
pub enum CloseTarget {
    /// Staff closing a specific user's application.
    User(UserId),
    /// Closing whatever application owns the invoking channel.
    Channel(ChannelId),
}

/// Replace literal `\n` escape sequences with real line breaks for display.
pub fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}

/// Per-user mutual exclusion. Entries are created on demand and kept for
/// the life of the process; the population is bounded by the user base.
#[derive(Default)]
struct UserLocks {
    inner: std::sync::Mutex<HashMap<UserId, Arc<AsyncMutex<()>>>>,
}

impl UserLocks {
    fn for_user(&self, user: &UserId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(user.clone()).or_default().clone()
    }
}

/// The application state machine, wired to its collaborators.
pub struct ApplicationWorkflow {
    catalog: PositionCatalog,
    records: ApplicationStore,
    channels: ChannelLifecycleManager,
    settings: Settings,
    locks: UserLocks,
}

impl ApplicationWorkflow {
    pub fn new(store: Arc<dyn DocumentStore>, host: Arc<dyn ChatHost>) -> Self {
        Self {
            catalog: PositionCatalog::new(Arc::clone(&store)),
            records: ApplicationStore::new(Arc::clone(&store)),
            channels: ChannelLifecycleManager::new(host),
            settings: Settings::new(store),
            locks: UserLocks::default(),
        }
    }

    /// The position catalog (admin CRUD goes straight through).
    pub fn catalog(&self) -> &PositionCatalog {
        &self.catalog
    }

    /// Workflow settings (main category).
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Begin an application: create the private channel under the main
    /// category, then persist the record carrying the new channel id.
    ///
    /// Holds the user's lock across the whole check-then-create sequence so
    /// two concurrent `start` calls cannot both pass the "no existing
    /// record" precondition.
    pub async fn start(&self, applicant: &Applicant) -> Result<ApplicationStarted, WorkflowError> {
        let lock = self.locks.for_user(&applicant.id);
        let _guard = lock.lock().await;

        if self
            .records
            .find_in_progress_by_user(&applicant.id)
            .await?
            .is_some()
        {
            return Err(WorkflowError::AlreadyInProgress);
        }

        let mut position_names = self.catalog.names().await?;
        if position_names.is_empty() {
            return Err(WorkflowError::NoPositionsConfigured);
        }
        position_names.sort_by_key(|name| name.to_lowercase());

        let group = self
            .settings
            .main_category()
            .await?
            .ok_or(WorkflowError::NotConfigured)?;

        // Channel first, record second: the record must never reference a
        // channel that does not exist yet.
        let channel_id = self.channels.create_for_applicant(applicant, &group).await?;
        let record = self.records.insert_new(&applicant.id, &channel_id).await?;

        tracing::info!(
            "application started for {} in channel {}",
            applicant.id,
            channel_id
        );
        Ok(ApplicationStarted {
            record,
            channel_id,
            position_names,
        })
    }

    /// The record a position answer should be routed to: in progress,
    /// bound to this channel, no position chosen yet.
    pub async fn awaiting_position_choice(
        &self,
        user: &UserId,
        channel: &ChannelId,
    ) -> Result<Option<ApplicationRecord>, WorkflowError> {
        Ok(self
            .records
            .find_in_progress(user, channel)
            .await?
            .filter(|record| record.selected_position.is_none()))
    }

    /// Resolve the user's answer to a position choice.
    ///
    /// Exact match is case-insensitive. A miss fails with up to two
    /// similarity-ranked suggestions and leaves the record untouched, so
    /// the user can retry any number of times. A hit relocates the channel,
    /// records the selection, and eagerly surfaces question 1; there is no
    /// separate first `advance`.
    pub async fn choose_position(
        &self,
        user: &UserId,
        channel: &ChannelId,
        raw_text: &str,
    ) -> Result<PositionChosen, WorkflowError> {
        let lock = self.locks.for_user(user);
        let _guard = lock.lock().await;

        let record = self
            .awaiting_position_choice(user, channel)
            .await?
            .ok_or(WorkflowError::NotInApplication)?;

        let answer = raw_text.trim();
        let Some(position) = self.catalog.find(answer).await? else {
            let names = self.catalog.names().await?;
            return Err(WorkflowError::PositionNotFound {
                input: answer.to_string(),
                suggestions: closest_matches(answer, &names),
            });
        };

        self.channels
            .relocate(&record.channel_id, &position.destination_group)
            .await?;

        // Pop question 1 before persisting, so the selection and the first
        // advance land in a single record update.
        let total = position.questions.len() as u32;
        let mut remaining = position.questions.clone();
        let Some((_, text)) = remaining.pop_next() else {
            return Err(WorkflowError::EmptyQuestionList);
        };
        self.records
            .assign_position(user, &position, &remaining)
            .await?;

        tracing::info!(
            "{} chose position {:?} ({} questions)",
            user,
            position.name,
            total
        );
        let first_question = QuestionPrompt {
            number: total - remaining.len() as u32,
            total,
            text: unescape_newlines(&text),
        };
        Ok(PositionChosen {
            position,
            first_question,
        })
    }

    /// Surface the next question, or report completion.
    ///
    /// Fails with `NotInApplication` when no in-progress record is bound to
    /// (user, channel), and identically when a record exists but no
    /// position has been chosen yet.
    pub async fn advance(
        &self,
        user: &UserId,
        channel: &ChannelId,
    ) -> Result<AdvanceOutcome, WorkflowError> {
        let lock = self.locks.for_user(user);
        let _guard = lock.lock().await;

        let record = self
            .records
            .find_in_progress(user, channel)
            .await?
            .ok_or(WorkflowError::NotInApplication)?;

        let (Some(mut remaining), Some(total)) =
            (record.remaining_questions, record.total_questions)
        else {
            return Err(WorkflowError::NotInApplication);
        };

        match remaining.pop_next() {
            None => Ok(AdvanceOutcome::Complete),
            Some((_, text)) => {
                self.records.save_remaining(user, &remaining).await?;
                let number = total - remaining.len() as u32;
                tracing::debug!("{} advanced to question {}/{}", user, number, total);
                Ok(AdvanceOutcome::Question(QuestionPrompt {
                    number,
                    total,
                    text: unescape_newlines(&text),
                }))
            }
        }
    }

    /// Close an application and tear down its channel.
    ///
    /// By channel: the close ran inside the application channel, so the
    /// channel is deleted unconditionally (the command cannot observe the
    /// deletion). By user: the channel is deleted only if it still exists,
    /// since staff may close an application whose channel was already removed,
    /// and that absence is not an error.
    pub async fn close(&self, target: CloseTarget) -> Result<ApplicationRecord, WorkflowError> {
        match target {
            CloseTarget::Channel(channel) => {
                // Find the owner first so the right user's lock is taken,
                // then re-check under the lock.
                let probe = self
                    .records
                    .find_in_progress_by_channel(&channel)
                    .await?
                    .ok_or(WorkflowError::RecordNotFound)?;
                let lock = self.locks.for_user(&probe.user_id);
                let _guard = lock.lock().await;

                let mut record = self
                    .records
                    .find_in_progress_by_channel(&channel)
                    .await?
                    .ok_or(WorkflowError::RecordNotFound)?;
                self.records.close_by_channel(&channel).await?;
                self.channels.remove(&channel).await?;

                tracing::info!("application in channel {} closed", channel);
                record.in_progress = false;
                Ok(record)
            }
            CloseTarget::User(user) => {
                let lock = self.locks.for_user(&user);
                let _guard = lock.lock().await;

                let mut record = self
                    .records
                    .find_in_progress_by_user(&user)
                    .await?
                    .ok_or(WorkflowError::RecordNotFound)?;
                self.records.close_by_user(&user).await?;
                if self.channels.exists(&record.channel_id).await? {
                    self.channels.remove(&record.channel_id).await?;
                }

                tracing::info!("application of {} closed", user);
                record.in_progress = false;
                Ok(record)
            }
        }
    }
}
