//! Quiz bot server library.
//!
//! Two independent activities share one tokio runtime:
//!
//! - the admin HTTP API ([`routes::build_router`]) with cookie sessions
//! - the VK long-poll bot ([`bot::Poller`]) that greets everyone who writes
//!   to the community
//!
//! All state is in memory and lost on restart.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bot;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod vk;
