//! Theme and question repository.

use quizbot_core::{QuestionId, ThemeId};

use super::{Database, RepositoryError, next_id};
use crate::models::{NewQuestion, Question, Theme};

/// Repository for quiz themes and questions.
pub struct QuizRepository<'a> {
    db: &'a Database,
}

impl<'a> QuizRepository<'a> {
    /// Create a new quiz repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a theme.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a theme with this title exists.
    pub async fn create_theme(&self, title: String) -> Result<Theme, RepositoryError> {
        let mut tables = self.db.tables.write().await;

        if tables.themes.values().any(|t| t.title == title) {
            return Err(RepositoryError::Conflict(format!(
                "theme {title:?} already exists"
            )));
        }

        let id = next_id(&tables.themes, ThemeId::new(1), ThemeId::next);
        let theme = Theme { id, title };
        tables.themes.insert(id, theme.clone());
        Ok(theme)
    }

    /// List all themes ordered by ID.
    pub async fn list_themes(&self) -> Vec<Theme> {
        self.db.tables.read().await.themes.values().cloned().collect()
    }

    /// Create a question under an existing theme.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the theme does not exist.
    /// Returns `RepositoryError::Conflict` if a question with this title exists.
    pub async fn create_question(&self, new: NewQuestion) -> Result<Question, RepositoryError> {
        let mut tables = self.db.tables.write().await;

        if !tables.themes.contains_key(&new.theme_id) {
            return Err(RepositoryError::NotFound("theme"));
        }
        if tables.questions.values().any(|q| q.title == new.title) {
            return Err(RepositoryError::Conflict(format!(
                "question {:?} already exists",
                new.title
            )));
        }

        let id = next_id(&tables.questions, QuestionId::new(1), QuestionId::next);
        let question = Question {
            id,
            title: new.title,
            theme_id: new.theme_id,
            answers: new.answers,
        };
        tables.questions.insert(id, question.clone());
        Ok(question)
    }

    /// List questions ordered by ID, optionally restricted to one theme.
    pub async fn list_questions(&self, theme_id: Option<ThemeId>) -> Vec<Question> {
        self.db
            .tables
            .read()
            .await
            .questions
            .values()
            .filter(|q| theme_id.is_none_or(|id| q.theme_id == id))
            .cloned()
            .collect()
    }
}
