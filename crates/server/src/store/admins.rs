//! Admin account repository.

use quizbot_core::{AdminId, Email};

use super::{Database, next_id};
use crate::models::Admin;

/// Repository for admin accounts.
pub struct AdminRepository<'a> {
    db: &'a Database,
}

impl<'a> AdminRepository<'a> {
    /// Create a new admin repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Get an admin by email.
    pub async fn get_by_email(&self, email: &Email) -> Option<Admin> {
        let tables = self.db.tables.read().await;
        tables.admins.values().find(|a| &a.email == email).cloned()
    }

    /// Get an admin by ID.
    pub async fn get_by_id(&self, id: AdminId) -> Option<Admin> {
        self.db.tables.read().await.admins.get(&id).cloned()
    }

    /// Create an admin, or return the existing one with the same email.
    ///
    /// The stored hash of an existing admin is left unchanged.
    pub async fn create(&self, email: Email, password_hash: String) -> Admin {
        let mut tables = self.db.tables.write().await;

        if let Some(existing) = tables.admins.values().find(|a| a.email == email) {
            return existing.clone();
        }

        let id = next_id(&tables.admins, AdminId::new(1), AdminId::next);
        let admin = Admin {
            id,
            email,
            password_hash,
        };
        tables.admins.insert(id, admin.clone());
        admin
    }

    /// Remove an admin, returning whether it existed.
    #[cfg(test)]
    pub async fn delete(&self, id: AdminId) -> bool {
        self.db.tables.write().await.admins.remove(&id).is_some()
    }
}
