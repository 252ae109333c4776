use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric identifier of a chat participant, as assigned by the transport.
///
/// Telegram user IDs fit in 52 bits, so `i64` is the natural carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl UserId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Identifier of the chat a message was posted in.
///
/// Equal to the sender's `UserId` for private chats, negative for groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl ChatId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// The author of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: UserId,
    /// Public handle without the leading `@`, if the user has one.
    pub username: Option<String>,
    pub first_name: String,
    #[serde(default)]
    pub is_bot: bool,
}

impl Sender {
    pub fn new(id: i64, first_name: impl Into<String>) -> Self {
        Self {
            id: UserId(id),
            username: None,
            first_name: first_name.into(),
            is_bot: false,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// Transport-neutral view of a chat message.
///
/// Channel adapters convert their native message type into this before
/// handing it to the dispatcher, so routing never depends on a client SDK.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub message_id: i32,
    pub chat_id: ChatId,
    /// `None` for anonymous channel posts.
    pub sender: Option<Sender>,
    /// Text body. Only this takes part in command and literal-text matching.
    pub text: Option<String>,
    /// Caption of a media message. Available to handlers, never matched on.
    #[serde(default)]
    pub caption: Option<String>,
    pub date: DateTime<Utc>,
}

impl InboundMessage {
    /// Build a text message from `sender` in their private chat.
    pub fn private_text(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            message_id: 0,
            chat_id: ChatId(sender.id.0),
            sender: Some(sender),
            text: Some(text.into()),
            caption: None,
            date: Utc::now(),
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    pub fn sender_id(&self) -> Option<UserId> {
        self.sender.as_ref().map(|s| s.id)
    }
}
