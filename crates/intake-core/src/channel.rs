// channel.rs — ChatHost trait and the channel lifecycle side of transitions.
//
// The chat platform is an external collaborator: the workflow only ever
// creates a private channel, relocates it between channel groups, deletes
// it, and asks whether it still exists. `ChatHost` is that contract; the
// `ChannelLifecycleManager` is the thin adapter the state machine calls,
// keeping platform vocabulary out of the workflow itself.
//
// Calls are awaited in transition order: a channel must exist before the
// record carrying its id is persisted.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::identity::{Applicant, ChannelId, GroupId, UserId};

/// Errors from chat-platform channel operations.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The platform rejected or failed the call.
    #[error("chat platform error: {0}")]
    Platform(String),

    /// The referenced channel does not exist.
    #[error("channel not found: {0}")]
    NotFound(ChannelId),
}

/// The chat-platform collaborator, reduced to what the workflow needs.
#[async_trait]
pub trait ChatHost: Send + Sync {
    /// Create a private channel visible to `owner` under `group`; returns
    /// the new channel's id.
    async fn create_private_channel(
        &self,
        owner: &UserId,
        name: &str,
        group: &GroupId,
    ) -> Result<ChannelId, ChannelError>;

    /// Move an existing channel into another channel group.
    async fn move_channel(&self, channel: &ChannelId, group: &GroupId) -> Result<(), ChannelError>;

    /// Delete a channel.
    async fn delete_channel(&self, channel: &ChannelId) -> Result<(), ChannelError>;

    /// Whether the channel still exists in the platform's channel set.
    async fn channel_exists(&self, channel: &ChannelId) -> Result<bool, ChannelError>;
}

/// Derive the application channel's name from the applicant's handle:
/// lowercased, ASCII punctuation and control characters stripped, "null"
/// when nothing survives, then `-<tag>-apply`.
pub fn channel_name_for(handle: &str, tag: &str) -> String {
    let cleaned: String = handle
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation() && !c.is_control())
        .collect();
    let base = if cleaned.is_empty() { "null" } else { &cleaned };
    format!("{base}-{tag}-apply")
}

/// Channel side effects of state transitions, as the workflow sees them.
pub struct ChannelLifecycleManager {
    host: Arc<dyn ChatHost>,
}

impl ChannelLifecycleManager {
    pub fn new(host: Arc<dyn ChatHost>) -> Self {
        Self { host }
    }

    /// Create the applicant's private channel under `group`.
    pub async fn create_for_applicant(
        &self,
        applicant: &Applicant,
        group: &GroupId,
    ) -> Result<ChannelId, ChannelError> {
        let name = channel_name_for(&applicant.handle, &applicant.tag);
        let channel = self
            .host
            .create_private_channel(&applicant.id, &name, group)
            .await?;
        tracing::info!("created application channel {} for {}", channel, applicant.id);
        Ok(channel)
    }

    /// Relocate a channel to the chosen position's destination group.
    pub async fn relocate(&self, channel: &ChannelId, group: &GroupId) -> Result<(), ChannelError> {
        tracing::debug!("relocating channel {} to group {}", channel, group);
        self.host.move_channel(channel, group).await
    }

    /// Delete a channel.
    pub async fn remove(&self, channel: &ChannelId) -> Result<(), ChannelError> {
        tracing::info!("deleting application channel {}", channel);
        self.host.delete_channel(channel).await
    }

    /// Whether a channel still exists.
    pub async fn exists(&self, channel: &ChannelId) -> Result<bool, ChannelError> {
        self.host.channel_exists(channel).await
    }
}
