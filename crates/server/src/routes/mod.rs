//! HTTP route handlers for the admin API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check (public)
//!
//! # Admin session
//! POST /admin.login            - Log in with email/password (public)
//! GET  /admin.current          - Current admin
//! POST /admin.logout           - Log out
//!
//! # Quiz
//! POST /quiz.add_theme         - Create theme
//! GET  /quiz.list_themes       - List themes
//! POST /quiz.add_question      - Create question
//! GET  /quiz.list_questions    - List questions (?theme_id=N)
//! ```
//!
//! Every route except `/health` and `/admin.login` sits behind
//! [`require_admin`]. Successful responses are `{"status": "ok", "data": ...}`.

pub mod admin;
pub mod quiz;

use axum::{
    Json, Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::{create_session_layer, require_admin};
use crate::state::AppState;

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    status: &'static str,
    data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap a payload in an `"ok"` envelope.
    #[must_use]
    pub const fn ok(data: T) -> Json<Self> {
        Json(Self { status: "ok", data })
    }
}

/// Build the admin API router with sessions and auth applied.
///
/// Tracing and Sentry layers are added by the binary.
pub fn build_router(state: AppState, secure_cookies: bool) -> Router {
    let protected = Router::new()
        .route("/admin.current", get(admin::current))
        .route("/admin.logout", post(admin::logout))
        .route("/quiz.add_theme", post(quiz::add_theme))
        .route("/quiz.list_themes", get(quiz::list_themes))
        .route("/quiz.add_question", post(quiz::add_question))
        .route("/quiz.list_questions", get(quiz::list_questions))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/health", get(health))
        .route("/admin.login", post(admin::login))
        .merge(protected)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(create_session_layer(secure_cookies))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

async fn not_found() -> AppError {
    AppError::NotFound("route not found".to_string())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed("method not allowed for this route".to_string())
}
