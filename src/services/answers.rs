// src/services/answers.rs

use chrono::{DateTime, Utc};

use super::require_student;
use crate::{
    error::QuizError,
    models::{
        attempt::AnswerRecord,
        caller::Caller,
        id::{AnswerId, AttemptId, OptionId, QuestionId},
        question::Question,
    },
    store::{QuizStore, StoreError},
};

/// Marks earned by selecting `selected` for `question`.
///
/// Full marks for the designated correct option, zero for anything else,
/// including a blank answer or a question with no correct option set.
pub fn grade(question: &Question, selected: Option<OptionId>) -> i32 {
    match (selected, question.correct_option) {
        (Some(chosen), Some(correct)) if chosen == correct => question.marks,
        _ => 0,
    }
}

/// Records (or replaces) the caller's answer to one question and grades it.
///
/// The attempt's `marks_obtained` is left alone; it is only computed when
/// the attempt is submitted.
pub async fn record_answer(
    store: &dyn QuizStore,
    attempt_id: AttemptId,
    question_id: QuestionId,
    selected_option_id: Option<OptionId>,
    caller: &Caller,
    now: DateTime<Utc>,
) -> Result<AnswerRecord, QuizError> {
    let student = require_student(caller, "answer quiz questions")?;

    let attempt = store
        .get_attempt(attempt_id)
        .await?
        .ok_or_else(|| QuizError::not_found("Quiz attempt"))?;

    if attempt.student_id != student.id {
        return Err(QuizError::forbidden("Attempt belongs to another student"));
    }

    if attempt.is_completed {
        return Err(QuizError::AttemptCompleted);
    }

    let question = store
        .get_question(question_id)
        .await?
        .filter(|q| q.quiz_id == attempt.quiz_id)
        .ok_or_else(|| QuizError::not_found("Question"))?;

    if let Some(option_id) = selected_option_id {
        store
            .get_option(option_id)
            .await?
            .filter(|o| o.question_id == question.id)
            .ok_or_else(|| QuizError::not_found("Option"))?;
    }

    let record = AnswerRecord {
        id: AnswerId::generate(),
        attempt_id: attempt.id,
        question_id: question.id,
        selected_option_id,
        marks_awarded: grade(&question, selected_option_id),
        answered_at: now,
    };

    // The store re-checks completion under the attempt lock; a submit that
    // won the race shows up here as `Completed`.
    let saved = store.upsert_answer(&record).await.map_err(|e| match e {
        StoreError::Completed => QuizError::AttemptCompleted,
        other => other.into(),
    })?;

    tracing::debug!(
        "Recorded answer for attempt {} question {} ({} marks)",
        saved.attempt_id,
        saved.question_id,
        saved.marks_awarded
    );

    Ok(saved)
}
