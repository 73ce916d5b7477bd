//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};

use quizbot_core::{AdminId, Email};

use super::admin::Admin;

/// Public view of the authenticated admin.
///
/// Attached to request extensions by the auth middleware and returned by the
/// login and current-admin endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Admin's ID.
    pub id: AdminId,
    /// Admin's email address.
    pub email: Email,
}

impl From<&Admin> for CurrentAdmin {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            email: admin.email.clone(),
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for the logged-in admin's ID.
    pub const ADMIN_ID: &str = "admin_id";
}
