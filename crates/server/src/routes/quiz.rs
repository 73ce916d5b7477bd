//! Quiz theme and question route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::info;

use quizbot_core::ThemeId;

use super::ApiResponse;
use crate::error::{ApiJson, ApiQuery, AppError};
use crate::middleware::RequireAdmin;
use crate::models::{NewQuestion, Question, Theme};
use crate::store::QuizRepository;
use crate::state::AppState;

/// Theme creation request body.
#[derive(Deserialize)]
pub struct AddThemeRequest {
    title: String,
}

/// Theme listing.
#[derive(Serialize)]
pub struct ThemeList {
    themes: Vec<Theme>,
}

/// Question listing.
#[derive(Serialize)]
pub struct QuestionList {
    questions: Vec<Question>,
}

/// Query parameters for the question listing.
#[derive(Deserialize)]
pub struct ListQuestionsQuery {
    theme_id: Option<String>,
}

/// Create a theme.
///
/// POST /quiz.add_theme
pub async fn add_theme(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(req): ApiJson<AddThemeRequest>,
) -> Result<Json<ApiResponse<Theme>>, AppError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("title must not be empty".to_string()));
    }

    let theme = QuizRepository::new(state.db())
        .create_theme(title.to_string())
        .await?;
    info!(admin_id = %admin.id, theme_id = %theme.id, "Theme created");

    Ok(ApiResponse::ok(theme))
}

/// List all themes.
///
/// GET /quiz.list_themes
pub async fn list_themes(State(state): State<AppState>) -> Json<ApiResponse<ThemeList>> {
    let themes = QuizRepository::new(state.db()).list_themes().await;
    ApiResponse::ok(ThemeList { themes })
}

/// Create a question with its answers.
///
/// POST /quiz.add_question
pub async fn add_question(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(new): ApiJson<NewQuestion>,
) -> Result<Json<ApiResponse<Question>>, AppError> {
    new.validate()?;

    let question = QuizRepository::new(state.db()).create_question(new).await?;
    info!(
        admin_id = %admin.id,
        question_id = %question.id,
        theme_id = %question.theme_id,
        "Question created"
    );

    Ok(ApiResponse::ok(question))
}

/// List questions, optionally for one theme.
///
/// GET /quiz.list_questions?theme_id=N
///
/// A `theme_id` that is not an integer is ignored.
pub async fn list_questions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuestionsQuery>,
) -> Json<ApiResponse<QuestionList>> {
    let theme_id = query
        .theme_id
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .map(ThemeId::new);

    let questions = QuizRepository::new(state.db())
        .list_questions(theme_id)
        .await;
    ApiResponse::ok(QuestionList { questions })
}
