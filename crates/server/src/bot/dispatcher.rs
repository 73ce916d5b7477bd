//! Routing of inbound messages to replies.

use tracing::{debug, info, instrument};

use quizbot_core::{InboundMessage, OutboundMessage, Update};

use super::sender::OutboundSender;
use crate::vk::VkError;

/// Routes new messages to the reply logic.
///
/// Deduplication compares against the single most recent message id only, so
/// a message redelivered within a batch or on the next poll is skipped but a
/// non-adjacent repeat is answered again.
#[derive(Debug)]
pub struct UpdateDispatcher {
    greeting: String,
    last_seen_message_id: Option<i64>,
}

impl UpdateDispatcher {
    /// Create a dispatcher that answers every new message with `greeting`.
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            greeting: greeting.into(),
            last_seen_message_id: None,
        }
    }

    /// Id of the last message accepted for a reply.
    #[must_use]
    pub const fn last_seen_message_id(&self) -> Option<i64> {
        self.last_seen_message_id
    }

    /// Process a batch in order and return the number of replies sent.
    ///
    /// Replies go out through `sender`, which in production is the same
    /// long-poll client that fetched the batch.
    ///
    /// The message id is recorded before its reply is sent, so a message
    /// whose reply fails is not retried.
    ///
    /// # Errors
    ///
    /// Returns the first send error; the rest of the batch is dropped.
    #[instrument(skip_all, fields(batch = updates.len()))]
    pub async fn handle<S: OutboundSender>(
        &mut self,
        sender: &S,
        updates: &[Update],
    ) -> Result<usize, VkError> {
        let mut sent = 0;

        for message in updates.iter().filter_map(Update::message) {
            if self.last_seen_message_id == Some(message.id) {
                debug!(message_id = message.id, "Skipping duplicate message");
                continue;
            }
            self.last_seen_message_id = Some(message.id);

            self.reply(sender, message).await?;
            sent += 1;
        }

        Ok(sent)
    }

    async fn reply<S: OutboundSender>(
        &self,
        sender: &S,
        message: &InboundMessage,
    ) -> Result<(), VkError> {
        info!(
            message_id = message.id,
            sender_id = message.sender_id,
            "Replying to new message"
        );
        let reply = OutboundMessage::new(message.sender_id, self.greeting.as_str());
        sender.send(&reply).await
    }
}
