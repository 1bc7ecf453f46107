//! # intake-core
//!
//! Application intake workflow for group-chat platforms: a user opens a
//! private channel, picks a position, and answers its questions one at a
//! time; staff close or inspect applications.
//!
//! The crate is the state machine and its typed persistence, not the chat
//! integration: the chat client and the document database are collaborator
//! traits ([`ChatHost`], [`DocumentStore`]) the embedder implements. All
//! progress lives in the store, so a process restart resumes every user's
//! questionnaire exactly where it stopped.
//!
//! ## Key components
//!
//! - [`ApplicationWorkflow`] — the state machine (start → choose position
//!   → question N of M → complete → closed), with per-user mutual
//!   exclusion across suspension points
//! - [`PositionCatalog`] — CRUD over hiring-role definitions
//! - [`ApplicationStore`] — typed accessor for application records
//! - [`ChannelLifecycleManager`] — channel side effects of transitions
//! - [`MemoryStore`] / [`JsonFileStore`] — reference store backends

pub mod channel;
pub mod config;
pub mod error;
pub mod fuzzy;
pub mod identity;
pub mod json_store;
pub mod memory_store;
pub mod position;
pub mod questions;
pub mod record;
pub mod store;
pub mod workflow;

pub use channel::{channel_name_for, ChannelError, ChannelLifecycleManager, ChatHost};
pub use config::Settings;
pub use error::WorkflowError;
pub use fuzzy::closest_matches;
pub use identity::{Applicant, ChannelId, GroupId, UserId};
pub use json_store::JsonFileStore;
pub use memory_store::MemoryStore;
pub use position::{Position, PositionCatalog};
pub use questions::QuestionSet;
pub use record::{ApplicationPhase, ApplicationRecord, ApplicationStore};
pub use store::{Document, DocumentStore, StoreError};
pub use workflow::{
    AdvanceOutcome, ApplicationStarted, ApplicationWorkflow, CloseTarget, PositionChosen,
    QuestionPrompt,
};
