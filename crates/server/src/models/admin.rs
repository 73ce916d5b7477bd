//! Admin account domain type.

use quizbot_core::{AdminId, Email};

/// An admin account.
#[derive(Clone)]
pub struct Admin {
    /// Unique admin ID.
    pub id: AdminId,
    /// Login email.
    pub email: Email,
    /// Argon2 PHC string.
    pub password_hash: String,
}

impl std::fmt::Debug for Admin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Admin")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}
