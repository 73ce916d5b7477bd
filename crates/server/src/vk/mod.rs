//! VK community bot integration.
//!
//! This module provides:
//! - [`VkApi`] for the method endpoint (`groups.getLongPollServer`, `messages.send`)
//! - [`LongPollClient`] which owns the long-poll session and turns raw
//!   responses into [`quizbot_core::Update`] batches
//! - Wire types for the VK JSON payloads
//!
//! # Long-poll recovery
//!
//! | Response       | Action                                     |
//! |----------------|--------------------------------------------|
//! | `updates`      | advance `ts`, return message updates       |
//! | `failed: 1`    | adopt the returned `ts`, return nothing    |
//! | `failed: 2, 3` | re-acquire key/server/ts, return nothing   |
//! | anything else  | [`VkError::Protocol`]                      |

mod api;
mod error;
mod long_poll;
mod types;

pub use api::VkApi;
pub use error::VkError;
pub use long_poll::{LongPollClient, PollSession};
pub use types::{
    ApiError, LongPollServer, MessageNewObject, PollResponse, RawUpdate, SendAck, VkResponse,
};
