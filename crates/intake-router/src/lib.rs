//! # intake-router
//!
//! The command boundary for the intake workflow. Maps prefix-stripped chat
//! commands and plain follow-up messages onto [`intake_core`] operations,
//! gates them on the caller's middleware-resolved permission level, and
//! produces platform-neutral reply data.
//!
//! ## Key components
//!
//! - [`Command`] — the command grammar (`apply`, `application next`,
//!   `positions quick ...`), parsed with a quote-aware tokenizer
//! - [`CommandRouter`] — dispatches commands and the multi-turn position
//!   choice ([`CommandRouter::on_message`])
//! - [`Reply`] / [`Message`] — outbound data the embedder renders

pub mod command;
pub mod reply;
pub mod router;

pub use command::{Command, CommandError, PermissionLevel};
pub use reply::{Message, Reply, ReplyKind};
pub use router::{CommandContext, CommandRouter};
