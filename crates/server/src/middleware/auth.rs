//! Authentication middleware and extractors.
//!
//! [`require_admin`] guards protected routes: it resolves the session's
//! `admin_id` to an account and attaches a [`CurrentAdmin`] to the request.
//! Handlers read it back with the [`RequireAdmin`] extractor.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

use quizbot_core::AdminId;

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentAdmin;
use crate::models::session::keys;
use crate::services::AdminAuthService;
use crate::state::AppState;

/// Middleware that rejects requests without a valid admin session.
///
/// - no `admin_id` in the session: 401
/// - `admin_id` of an account that no longer exists: 403
///
/// # Errors
///
/// Returns the rejection as an [`AppError`] response.
pub async fn require_admin(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let admin_id: AdminId = session
        .get(keys::ADMIN_ID)
        .await?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))?;

    let admin = AdminAuthService::new(state.db())
        .authenticate(admin_id)
        .await?;
    let current = CurrentAdmin::from(&admin);

    set_sentry_user(current.id.as_i64(), Some(current.email.as_str()));
    request.extensions_mut().insert(current);

    Ok(next.run(request).await)
}

/// Extractor for the admin attached by [`require_admin`].
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.email)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentAdmin>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))
    }
}

/// Record a successful login in the session.
///
/// The session ID is cycled first so a pre-login cookie cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin_id: AdminId,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::ADMIN_ID, admin_id).await
}

/// Drop all session data (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
