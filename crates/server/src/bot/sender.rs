//! Outbound reply transport.

use std::future::Future;

use quizbot_core::OutboundMessage;

use crate::vk::{LongPollClient, VkError};

/// Something that can deliver a reply to a user.
///
/// No retry or queueing happens behind this trait; a failed send is
/// reported to the caller once.
pub trait OutboundSender {
    /// Deliver a single message.
    fn send(&self, message: &OutboundMessage) -> impl Future<Output = Result<(), VkError>> + Send;
}

impl OutboundSender for LongPollClient {
    async fn send(&self, message: &OutboundMessage) -> Result<(), VkError> {
        Self::send(self, message).await
    }
}
