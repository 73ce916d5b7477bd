//! Admin session route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::{info, instrument};

use super::ApiResponse;
use crate::error::{ApiJson, AppError, clear_sentry_user};
use crate::middleware::{RequireAdmin, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::AdminAuthService;
use crate::state::AppState;

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// Log in with email and password.
///
/// POST /admin.login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<CurrentAdmin>>, AppError> {
    let admin = AdminAuthService::new(state.db())
        .login(&req.email, &req.password)
        .await?;

    set_current_admin(&session, admin.id).await?;
    info!(admin_id = %admin.id, "Admin logged in");

    Ok(ApiResponse::ok(CurrentAdmin::from(&admin)))
}

/// Return the logged-in admin.
///
/// GET /admin.current
pub async fn current(RequireAdmin(admin): RequireAdmin) -> Json<ApiResponse<CurrentAdmin>> {
    ApiResponse::ok(admin)
}

/// Log out and clear the session.
///
/// POST /admin.logout
pub async fn logout(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    info!(admin_id = %admin.id, "Admin logged out");

    Ok(ApiResponse::ok(json!({})))
}
