// error.rs — Error taxonomy for the intake workflow.
//
// Every variant except Store and Channel is a recoverable-by-user condition
// that the boundary renders as an error reply. Store and Channel wrap
// collaborator faults and propagate to the boundary as unrecoverable.

use thiserror::Error;

use crate::channel::ChannelError;
use crate::store::StoreError;

/// Errors from workflow, catalog, and settings operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The user already has an application in progress.
    #[error("an application is already in progress for this user")]
    AlreadyInProgress,

    /// No positions exist to apply for.
    #[error("no positions are configured")]
    NoPositionsConfigured,

    /// The main application category has not been set by an admin.
    #[error("the main application category is not configured")]
    NotConfigured,

    /// No position matched the given name. Carries up to two
    /// similarity-ranked suggestions; empty when nothing cleared the
    /// threshold.
    #[error("position not found: {input}")]
    PositionNotFound {
        input: String,
        suggestions: Vec<String>,
    },

    /// A position with this (case-folded) name already exists.
    #[error("a position named {0:?} already exists")]
    DuplicateName(String),

    /// A position must carry at least one question.
    #[error("a position must have at least one question")]
    EmptyQuestionList,

    /// The command was issued outside an active application channel, or
    /// before a position was chosen.
    #[error("no application in progress for this user and channel")]
    NotInApplication,

    /// No application record matched the close target.
    #[error("no matching application record")]
    RecordNotFound,

    /// Document store fault, unrecoverable at this layer.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Chat platform fault, unrecoverable at this layer.
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

impl WorkflowError {
    /// Whether this is a user-recoverable condition (rendered as a reply)
    /// as opposed to a collaborator fault (propagated to the boundary).
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, WorkflowError::Store(_) | WorkflowError::Channel(_))
    }
}
