//! Quiz Bot Core - Shared types library.
//!
//! This crate provides the types shared by the server and its tests:
//! - Type-safe entity IDs for admins, themes and questions
//! - A validated [`Email`] address
//! - Messaging types exchanged between the long-poll client and the bot
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
