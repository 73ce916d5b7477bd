//! In-memory storage for admins and quiz content.
//!
//! Everything lives behind a single `tokio::sync::RwLock`, so multi-step
//! checks (uniqueness, foreign keys) run under one write guard. Data does not
//! survive a restart.
//!
//! Access goes through narrow repositories:
//!
//! - [`AdminRepository`] - admin accounts
//! - [`QuizRepository`] - themes and questions

pub mod admins;
pub mod quiz;

use std::collections::BTreeMap;

use thiserror::Error;
use tokio::sync::RwLock;

use quizbot_core::{AdminId, QuestionId, ThemeId};

use crate::models::{Admin, Question, Theme};

pub use admins::AdminRepository;
pub use quiz::QuizRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// A referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Constraint violation (e.g., unique title).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

#[derive(Debug, Default)]
struct Tables {
    admins: BTreeMap<AdminId, Admin>,
    themes: BTreeMap<ThemeId, Theme>,
    questions: BTreeMap<QuestionId, Question>,
}

/// Process-local database.
#[derive(Debug, Default)]
pub struct Database {
    tables: RwLock<Tables>,
}

impl Database {
    /// Create an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Next identifier for an auto-incrementing table, starting at 1.
fn next_id<K, V>(table: &BTreeMap<K, V>, first: K, next: impl Fn(K) -> K) -> K
where
    K: Copy + Ord,
{
    table.last_key_value().map_or(first, |(id, _)| next(*id))
}
