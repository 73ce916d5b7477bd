//! Background bot built on the VK long-poll client.
//!
//! - [`Poller`] runs the fetch loop as a tokio task with start/stop control
//! - [`UpdateDispatcher`] deduplicates incoming messages and replies
//! - [`OutboundSender`] is the seam through which replies leave the process
//!
//! # Flow
//!
//! 1. The poller calls [`crate::vk::LongPollClient::fetch`]
//! 2. Non-empty batches go to [`UpdateDispatcher::handle`]
//! 3. Each new message produces a greeting sent via the [`OutboundSender`]
//! 4. Any failure is logged, reported to Sentry, and retried after a fixed backoff

mod dispatcher;
mod poller;
mod sender;

pub use dispatcher::UpdateDispatcher;
pub use poller::Poller;
pub use sender::OutboundSender;
