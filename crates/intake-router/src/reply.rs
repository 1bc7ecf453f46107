// reply.rs — Outbound reply data.
//
// The router produces plain data, not rendered messages: the embedding
// chat integration turns a Message into whatever its platform calls an
// embed. One dispatch can yield several messages aimed at different
// channels (starting an application answers in the invoking channel and
// prompts in the new one).

use serde::{Deserialize, Serialize};

use intake_core::ChannelId;

/// Visual flavor of a message (platforms typically map this to a color).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Success,
    Error,
    Info,
}

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub kind: ReplyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    /// Delivery channel; `None` means the invoking channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChannelId>,
}

impl Message {
    pub fn success(body: impl Into<String>) -> Self {
        Self::new(ReplyKind::Success, body)
    }

    pub fn error(body: impl Into<String>) -> Self {
        Self::new(ReplyKind::Error, body)
    }

    pub fn info(body: impl Into<String>) -> Self {
        Self::new(ReplyKind::Info, body)
    }

    fn new(kind: ReplyKind, body: impl Into<String>) -> Self {
        Self {
            kind,
            title: None,
            body: body.into(),
            footer: None,
            channel: None,
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// Deliver to a specific channel instead of the invoking one.
    pub fn in_channel(mut self, channel: ChannelId) -> Self {
        self.channel = Some(channel);
        self
    }
}

/// Everything a dispatch wants sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub messages: Vec<Message>,
}

impl Reply {
    pub fn single(message: Message) -> Self {
        Self {
            messages: vec![message],
        }
    }

    pub fn success(body: impl Into<String>) -> Self {
        Self::single(Message::success(body))
    }

    pub fn error(body: impl Into<String>) -> Self {
        Self::single(Message::error(body))
    }

    pub fn info(body: impl Into<String>) -> Self {
        Self::single(Message::info(body))
    }
}
