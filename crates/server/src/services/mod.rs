//! Business logic services for the admin API.
//!
//! # Services
//!
//! - `auth` - Password login and admin bootstrap

pub mod auth;

pub use auth::{AdminAuthError, AdminAuthService};
