// command.rs — Command grammar and permission levels.
//
// Commands arrive as prefix-stripped text ("application close @someone").
// Parsing is a small quote-aware tokenizer: multi-word position names are
// double-quoted, and the trailing questions argument of `positions quick`
// consumes the rest of the line verbatim (questions are split on the
// literal two-character delimiter `//`).
//
// Permission checking itself lives in the surrounding middleware; the
// router only compares the caller's already-resolved level against each
// command's requirement.

use std::fmt;

use thiserror::Error;

use intake_core::{GroupId, UserId};

/// Caller privilege, resolved by the platform middleware before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PermissionLevel {
    Regular,
    Moderator,
    Admin,
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionLevel::Regular => write!(f, "regular"),
            PermissionLevel::Moderator => write!(f, "moderator"),
            PermissionLevel::Admin => write!(f, "admin"),
        }
    }
}

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Begin an application.
    Apply,
    /// Ask the next question in the invoking channel.
    ApplicationNext,
    /// Close an application: a specific user's when a target is given,
    /// otherwise whatever application owns the invoking channel.
    ApplicationClose { target: Option<UserId> },
    /// Set the channel group new application channels are created under.
    ConfigMainCategory { group: GroupId },
    /// Create a position in one line.
    PositionsQuick {
        name: String,
        group: GroupId,
        questions: Vec<String>,
    },
    /// List all positions.
    PositionsAll,
    /// Show one position's questions.
    PositionsView { name: String },
    /// Delete a position.
    PositionsDelete { name: String },
}

/// Parse failures, rendered to the user as usage hints.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("unbalanced quotes in command")]
    UnbalancedQuotes,
}

const APPLICATION_USAGE: &str = "application <next|close [user]>";
const APPLYCONFIG_USAGE: &str = "applyconfig maincategory <group>";
const POSITIONS_USAGE: &str = "positions <quick|all|view|delete>";
const QUICK_USAGE: &str = "positions quick <name> <group> <q1>//<q2>//...";
const VIEW_USAGE: &str = "positions view <name>";
const DELETE_USAGE: &str = "positions delete <name>";

impl Command {
    /// Parse a prefix-stripped command line.
    pub fn parse(input: &str) -> Result<Command, CommandError> {
        let (keyword, rest) = match next_token(input)? {
            Some(parts) => parts,
            None => return Err(CommandError::UnknownCommand(String::new())),
        };

        match keyword.as_str() {
            "apply" => Ok(Command::Apply),
            "application" => parse_application(rest),
            "applyconfig" => parse_applyconfig(rest),
            "positions" => parse_positions(rest),
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }

    /// The minimum level required to run this command. Closing someone
    /// else's application takes Moderator; closing your own channel does
    /// not.
    pub fn required_level(&self) -> PermissionLevel {
        match self {
            Command::Apply | Command::ApplicationNext => PermissionLevel::Regular,
            Command::ApplicationClose { target: None } => PermissionLevel::Regular,
            Command::ApplicationClose { target: Some(_) } => PermissionLevel::Moderator,
            Command::ConfigMainCategory { .. }
            | Command::PositionsQuick { .. }
            | Command::PositionsAll
            | Command::PositionsView { .. }
            | Command::PositionsDelete { .. } => PermissionLevel::Admin,
        }
    }
}

fn parse_application(rest: &str) -> Result<Command, CommandError> {
    let (sub, rest) = match next_token(rest)? {
        Some(parts) => parts,
        None => return Err(CommandError::Usage(APPLICATION_USAGE)),
    };
    match sub.as_str() {
        "next" => Ok(Command::ApplicationNext),
        "close" => {
            let target = next_token(rest)?.map(|(token, _)| user_from_mention(&token));
            Ok(Command::ApplicationClose { target })
        }
        _ => Err(CommandError::Usage(APPLICATION_USAGE)),
    }
}

fn parse_applyconfig(rest: &str) -> Result<Command, CommandError> {
    let (sub, rest) = match next_token(rest)? {
        Some(parts) => parts,
        None => return Err(CommandError::Usage(APPLYCONFIG_USAGE)),
    };
    match sub.as_str() {
        "maincategory" => match next_token(rest)? {
            Some((group, _)) => Ok(Command::ConfigMainCategory {
                group: GroupId::from(group),
            }),
            None => Err(CommandError::Usage(APPLYCONFIG_USAGE)),
        },
        _ => Err(CommandError::Usage(APPLYCONFIG_USAGE)),
    }
}

fn parse_positions(rest: &str) -> Result<Command, CommandError> {
    let (sub, rest) = match next_token(rest)? {
        Some(parts) => parts,
        None => return Err(CommandError::Usage(POSITIONS_USAGE)),
    };
    match sub.as_str() {
        "quick" => {
            let Some((name, rest)) = next_token(rest)? else {
                return Err(CommandError::Usage(QUICK_USAGE));
            };
            let Some((group, rest)) = next_token(rest)? else {
                return Err(CommandError::Usage(QUICK_USAGE));
            };
            let questions_raw = rest.trim();
            // Tolerate a fully quoted questions argument.
            let questions_raw = questions_raw
                .strip_prefix('"')
                .and_then(|inner| inner.strip_suffix('"'))
                .unwrap_or(questions_raw);
            if questions_raw.is_empty() {
                return Err(CommandError::Usage(QUICK_USAGE));
            }
            let questions = questions_raw
                .split("//")
                .map(|q| q.to_string())
                .collect();
            Ok(Command::PositionsQuick {
                name,
                group: GroupId::from(group),
                questions,
            })
        }
        "all" => Ok(Command::PositionsAll),
        // view and delete take the rest of the line as the name, no quotes
        // needed.
        "view" => match rest.trim() {
            "" => Err(CommandError::Usage(VIEW_USAGE)),
            name => Ok(Command::PositionsView {
                name: name.to_string(),
            }),
        },
        "delete" => match rest.trim() {
            "" => Err(CommandError::Usage(DELETE_USAGE)),
            name => Ok(Command::PositionsDelete {
                name: name.to_string(),
            }),
        },
        _ => Err(CommandError::Usage(POSITIONS_USAGE)),
    }
}

/// Pop the next whitespace-delimited or double-quoted token. Returns the
/// token and the unconsumed remainder.
fn next_token(input: &str) -> Result<Option<(String, &str)>, CommandError> {
    let rest = input.trim_start();
    if rest.is_empty() {
        return Ok(None);
    }
    if let Some(quoted) = rest.strip_prefix('"') {
        match quoted.find('"') {
            Some(end) => Ok(Some((quoted[..end].to_string(), &quoted[end + 1..]))),
            None => Err(CommandError::UnbalancedQuotes),
        }
    } else {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        Ok(Some((rest[..end].to_string(), &rest[end..])))
    }
}

/// Accept both a raw user id and a platform mention (`<@id>` / `<@!id>`).
fn user_from_mention(token: &str) -> UserId {
    let inner = token
        .strip_prefix("<@!")
        .or_else(|| token.strip_prefix("<@"))
        .and_then(|mention| mention.strip_suffix('>'))
        .unwrap_or(token);
    UserId::from(inner)
}
