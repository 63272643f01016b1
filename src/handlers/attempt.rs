// src/handlers/attempt.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;

use crate::{
    error::AppError,
    models::{attempt::RecordAnswerRequest, caller::Caller, id::AttemptId},
    services::{answers, attempts},
    state::SharedStore,
};

/// Records one answer and returns the graded record.
///
/// Re-answering a question replaces the previous answer.
pub async fn record_answer(
    State(store): State<SharedStore>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<RecordAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let record = answers::record_answer(
        store.as_ref(),
        req.attempt_id,
        req.question_id,
        req.selected_option_id,
        &caller,
        Utc::now(),
    )
    .await?;

    Ok(Json(record))
}

/// The calling student's attempts, newest first.
pub async fn list_my_attempts(
    State(store): State<SharedStore>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    let list = attempts::list_my_attempts(store.as_ref(), &caller).await?;
    Ok(Json(list))
}

pub async fn get_attempt(
    State(store): State<SharedStore>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<AttemptId>,
) -> Result<impl IntoResponse, AppError> {
    let view = attempts::get_attempt(store.as_ref(), id, &caller).await?;
    Ok(Json(view))
}
