//! Admin authentication error types.

use thiserror::Error;

/// Errors that can occur during admin authentication operations.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] quizbot_core::EmailError),

    /// Unknown email or wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The session refers to an admin that no longer exists.
    #[error("admin not found")]
    AdminNotFound,

    /// Password hashing failed.
    #[error("failed to hash password")]
    PasswordHash,
}
