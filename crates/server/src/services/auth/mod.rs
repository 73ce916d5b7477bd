//! Admin authentication service.
//!
//! Password login against Argon2id hashes, session-id lookup, and the startup
//! bootstrap of the configured admin account.

mod error;

pub use error::AdminAuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument};

use quizbot_core::{AdminId, Email};

use crate::models::Admin;
use crate::store::{AdminRepository, Database};

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    admins: AdminRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self {
            admins: AdminRepository::new(db),
        }
    }

    /// Ensure an admin exists for `email`.
    ///
    /// Creates the account with a freshly hashed password if it is missing;
    /// an existing account is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::PasswordHash` if hashing fails.
    #[instrument(skip(self, email, password), fields(email = %email))]
    pub async fn bootstrap(
        &self,
        email: Email,
        password: &SecretString,
    ) -> Result<Admin, AdminAuthError> {
        if let Some(existing) = self.admins.get_by_email(&email).await {
            info!(admin_id = %existing.id, "Admin already exists");
            return Ok(existing);
        }

        let hash = hash_password(password.expose_secret())?;
        let admin = self.admins.create(email, hash).await;
        info!(admin_id = %admin.id, "Admin created");
        Ok(admin)
    }

    /// Check an email/password pair.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidEmail` if the email is malformed.
    /// Returns `AdminAuthError::InvalidCredentials` if the email is unknown
    /// or the password does not match.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Admin, AdminAuthError> {
        let email = Email::parse(email)?;
        let admin = self
            .admins
            .get_by_email(&email)
            .await
            .ok_or(AdminAuthError::InvalidCredentials)?;

        verify_password(password, &admin.password_hash)?;
        Ok(admin)
    }

    /// Resolve the admin a session points at.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::AdminNotFound` if the admin no longer exists.
    pub async fn authenticate(&self, admin_id: AdminId) -> Result<Admin, AdminAuthError> {
        self.admins
            .get_by_id(admin_id)
            .await
            .ok_or(AdminAuthError::AdminNotFound)
    }
}

/// Hash a password with Argon2id.
fn hash_password(password: &str) -> Result<String, AdminAuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AdminAuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AdminAuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AdminAuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AdminAuthError::InvalidCredentials)
}
