//! HTTP middleware for the admin API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, set up transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `MemoryStore`)
//! 4. Auth guard (`route_layer` on every protected route)

pub mod auth;
pub mod session;

pub use auth::{RequireAdmin, clear_current_admin, require_admin, set_current_admin};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
