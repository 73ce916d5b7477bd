//! Core types for the quiz bot.

pub mod email;
pub mod id;
pub mod message;

pub use email::{Email, EmailError};
pub use id::*;
pub use message::{InboundMessage, OutboundMessage, Update, UpdateKind};
