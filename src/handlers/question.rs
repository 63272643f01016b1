// src/handlers/question.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{
        caller::Caller,
        id::QuestionId,
        question::{CreateOptionRequest, SetCorrectOptionRequest},
    },
    services::catalog,
    state::SharedStore,
};

/// Adds an option to a question; `is_correct` also designates it as the answer.
pub async fn add_option(
    State(store): State<SharedStore>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<QuestionId>,
    Json(payload): Json<CreateOptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let option = catalog::add_option(store.as_ref(), id, &caller, payload).await?;
    Ok((StatusCode::CREATED, Json(option)))
}

pub async fn set_correct_option(
    State(store): State<SharedStore>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<QuestionId>,
    Json(payload): Json<SetCorrectOptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question =
        catalog::set_correct_option(store.as_ref(), id, payload.option_id, &caller).await?;
    Ok(Json(question))
}
