//! Quiz themes and questions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use quizbot_core::{QuestionId, ThemeId};

/// A question category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: ThemeId,
    pub title: String,
}

/// One answer option of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub title: String,
    pub is_correct: bool,
}

/// A question with its answer options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub title: String,
    pub theme_id: ThemeId,
    pub answers: Vec<Answer>,
}

/// A question that has not been stored yet.
#[derive(Debug, Clone, Deserialize)]
pub struct NewQuestion {
    pub title: String,
    pub theme_id: ThemeId,
    pub answers: Vec<Answer>,
}

/// Why a new question was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnswersError {
    #[error("question title must not be empty")]
    EmptyTitle,
    #[error("answer {0} has an empty title")]
    EmptyAnswerTitle(usize),
    #[error("question must have at least two answers")]
    TooFew,
    #[error("question must have exactly one correct answer, got {0}")]
    CorrectCount(usize),
}

impl NewQuestion {
    /// Check the question before it is stored.
    ///
    /// Titles must not be blank. There must be at least two answers and
    /// exactly one of them correct.
    ///
    /// # Errors
    ///
    /// Returns the first rule the question breaks.
    pub fn validate(&self) -> Result<(), AnswersError> {
        if self.title.trim().is_empty() {
            return Err(AnswersError::EmptyTitle);
        }
        if let Some(idx) = self.answers.iter().position(|a| a.title.trim().is_empty()) {
            return Err(AnswersError::EmptyAnswerTitle(idx));
        }

        if self.answers.len() < 2 {
            return Err(AnswersError::TooFew);
        }

        match self.answers.iter().filter(|a| a.is_correct).count() {
            1 => Ok(()),
            n => Err(AnswersError::CorrectCount(n)),
        }
    }
}
