// identity.rs — Identifier newtypes for the chat-platform collaborators.
//
// The workflow is platform-agnostic: users, channels, and channel groups are
// opaque identifiers handed to us by the surrounding chat client. Wrapping
// them in newtypes keeps "which kind of id is this?" a compile-time question
// instead of a runtime one.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a chat-platform user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Identity of a chat-platform channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

/// Identity of a channel group (the platform's "category" concept;
/// application channels are created under one and relocated to another).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub String);

macro_rules! id_impls {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $ty {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $ty {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl $ty {
            /// The raw identifier string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }
    };
}

id_impls!(UserId);
id_impls!(ChannelId);
id_impls!(GroupId);

/// The acting user as resolved by the chat client: identity plus the handle
/// and tag used to derive the application channel's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    /// Platform identity.
    pub id: UserId,
    /// Display handle (e.g. the username), any case.
    pub handle: String,
    /// Disambiguating tag appended to the channel name (e.g. a discriminator).
    pub tag: String,
}

impl Applicant {
    pub fn new(id: impl Into<UserId>, handle: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            handle: handle.into(),
            tag: tag.into(),
        }
    }
}
