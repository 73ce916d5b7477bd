//! Messaging types exchanged between the long-poll client and the bot.
//!
//! User and message identifiers come straight from the messaging platform,
//! so they are plain `i64` values rather than `define_id!` newtypes.

use serde::{Deserialize, Serialize};

/// A message received from a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Platform message ID.
    pub id: i64,
    /// Platform ID of the user who sent the message.
    pub sender_id: i64,
    /// Message body.
    pub text: String,
}

/// A reply addressed to a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Platform ID of the user receiving the message.
    pub recipient_id: i64,
    /// Message body.
    pub text: String,
}

impl OutboundMessage {
    /// Create a new outbound message.
    #[must_use]
    pub fn new(recipient_id: i64, text: impl Into<String>) -> Self {
        Self {
            recipient_id,
            text: text.into(),
        }
    }
}

/// Discriminant of an [`Update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// A new message was sent to the bot.
    MessageNew,
    /// Any other event type.
    Other,
}

/// A normalized event received from the long-poll server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// A new message was sent to the bot.
    MessageNew(InboundMessage),
    /// Any other event, carrying the platform's event type name.
    Other(String),
}

impl Update {
    /// The kind of this update.
    #[must_use]
    pub const fn kind(&self) -> UpdateKind {
        match self {
            Self::MessageNew(_) => UpdateKind::MessageNew,
            Self::Other(_) => UpdateKind::Other,
        }
    }

    /// The message carried by this update, if any.
    #[must_use]
    pub const fn message(&self) -> Option<&InboundMessage> {
        match self {
            Self::MessageNew(message) => Some(message),
            Self::Other(_) => None,
        }
    }
}
