// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use crate::{
    error::AppError,
    models::{
        caller::Caller,
        id::QuizId,
        question::CreateQuestionRequest,
        quiz::CreateQuizRequest,
    },
    services::{attempts, catalog},
    state::SharedStore,
};

/// Lists the quizzes visible to the caller.
///
/// Teachers get the quizzes they created; students get the quizzes assigned
/// to their section.
pub async fn list_quizzes(
    State(store): State<SharedStore>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = catalog::list_quizzes(store.as_ref(), &caller, Utc::now()).await?;
    Ok(Json(quizzes))
}

/// Creates a quiz. Teacher only.
pub async fn create_quiz(
    State(store): State<SharedStore>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = catalog::create_quiz(store.as_ref(), &caller, payload, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Quiz detail with questions and options.
pub async fn get_quiz(
    State(store): State<SharedStore>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<QuizId>,
) -> Result<impl IntoResponse, AppError> {
    let detail = catalog::get_quiz(store.as_ref(), id, &caller, Utc::now()).await?;
    Ok(Json(detail))
}

/// Adds a question to a quiz. Owning teacher only.
pub async fn add_question(
    State(store): State<SharedStore>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<QuizId>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question = catalog::add_question(store.as_ref(), id, &caller, payload, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

/// Starts the calling student's attempt.
pub async fn start_attempt(
    State(store): State<SharedStore>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<QuizId>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = attempts::start_attempt(store.as_ref(), id, &caller, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Submits the calling student's attempt and returns the final score.
pub async fn submit_attempt(
    State(store): State<SharedStore>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<QuizId>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = attempts::submit_attempt(store.as_ref(), id, &caller, Utc::now()).await?;
    Ok(Json(attempt))
}

/// The calling student's attempt at this quiz, with answers.
pub async fn get_my_attempt(
    State(store): State<SharedStore>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<QuizId>,
) -> Result<impl IntoResponse, AppError> {
    let view = attempts::get_attempt_for_quiz(store.as_ref(), id, &caller).await?;
    Ok(Json(view))
}

/// All attempts at this quiz. Owning teacher only.
pub async fn list_quiz_attempts(
    State(store): State<SharedStore>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<QuizId>,
) -> Result<impl IntoResponse, AppError> {
    let list = attempts::list_quiz_attempts(store.as_ref(), id, &caller).await?;
    Ok(Json(list))
}
