// src/services/attempts.rs

use chrono::{DateTime, Utc};

use super::{availability, require_student, require_teacher, scoring};
use crate::{
    error::QuizError,
    models::{
        attempt::{AttemptView, QuizAttempt},
        caller::Caller,
        id::{AttemptId, QuizId},
    },
    store::{ATTEMPT_UNIQUE_CONSTRAINT, QuizStore, StoreError},
};

/// Starts the caller's one and only attempt at a quiz.
///
/// No existence pre-check is made: the unique (student, quiz) constraint
/// decides, so of several concurrent starts exactly one succeeds and the
/// others get `AttemptAlreadyExists`.
pub async fn start_attempt(
    store: &dyn QuizStore,
    quiz_id: QuizId,
    caller: &Caller,
    now: DateTime<Utc>,
) -> Result<QuizAttempt, QuizError> {
    let student = require_student(caller, "start quiz attempts")?;

    let quiz = store
        .get_quiz(quiz_id)
        .await?
        .filter(|q| q.is_visible_to(caller))
        .ok_or_else(|| QuizError::not_found("Quiz"))?;

    if !availability::is_active(&quiz, now) {
        return Err(QuizError::QuizNotActive);
    }

    let attempt = QuizAttempt::begin(student.id, quiz.id, now);

    match store.create_attempt(&attempt).await {
        Ok(()) => {
            tracing::info!(
                "Student {} started attempt {} on quiz {}",
                student.id,
                attempt.id,
                quiz.id
            );
            Ok(attempt)
        }
        Err(StoreError::UniqueViolation(constraint))
            if constraint == ATTEMPT_UNIQUE_CONSTRAINT =>
        {
            tracing::warn!(
                "Student {} already has an attempt on quiz {}",
                student.id,
                quiz.id
            );
            Err(QuizError::AttemptAlreadyExists)
        }
        Err(e) => Err(e.into()),
    }
}

/// Scores and completes the caller's attempt at a quiz.
///
/// Completion is terminal: a second submit fails with `AlreadyCompleted`
/// and leaves the recorded score untouched.
pub async fn submit_attempt(
    store: &dyn QuizStore,
    quiz_id: QuizId,
    caller: &Caller,
    now: DateTime<Utc>,
) -> Result<QuizAttempt, QuizError> {
    let student = require_student(caller, "submit quiz attempts")?;

    let attempt = store
        .find_attempt(student.id, quiz_id)
        .await?
        .ok_or_else(|| QuizError::not_found("Quiz attempt"))?;

    if attempt.is_completed {
        return Err(QuizError::AlreadyCompleted);
    }

    let completed = store
        .finalize_attempt(attempt.id, now, scoring::compute_score)
        .await
        .map_err(|e| match e {
            StoreError::Completed => QuizError::AlreadyCompleted,
            other => other.into(),
        })?;

    tracing::info!(
        "Student {} submitted attempt {} with {} marks",
        student.id,
        completed.id,
        completed.marks_obtained
    );

    Ok(completed)
}

/// Checks that the caller may read `attempt`.
///
/// Students read their own attempts; teachers read attempts at quizzes
/// they authored.
async fn authorize_read(
    store: &dyn QuizStore,
    attempt: &QuizAttempt,
    caller: &Caller,
) -> Result<(), QuizError> {
    match caller {
        Caller::Student(student) if attempt.student_id == student.id => Ok(()),
        Caller::Student(_) => Err(QuizError::forbidden("Attempt belongs to another student")),
        Caller::Teacher(teacher) => {
            let owns_quiz = store
                .get_quiz(attempt.quiz_id)
                .await?
                .is_some_and(|q| q.is_owned_by(teacher.id));
            if owns_quiz {
                Ok(())
            } else {
                Err(QuizError::forbidden("Attempt is for another teacher's quiz"))
            }
        }
    }
}

pub async fn get_attempt(
    store: &dyn QuizStore,
    attempt_id: AttemptId,
    caller: &Caller,
) -> Result<AttemptView, QuizError> {
    let attempt = store
        .get_attempt(attempt_id)
        .await?
        .ok_or_else(|| QuizError::not_found("Quiz attempt"))?;

    authorize_read(store, &attempt, caller).await?;

    let answers = store.list_answers(attempt.id).await?;
    Ok(AttemptView::new(attempt, answers))
}

/// The caller's own attempt at a quiz.
pub async fn get_attempt_for_quiz(
    store: &dyn QuizStore,
    quiz_id: QuizId,
    caller: &Caller,
) -> Result<AttemptView, QuizError> {
    let student = require_student(caller, "look up their attempt by quiz")?;

    let attempt = store
        .find_attempt(student.id, quiz_id)
        .await?
        .ok_or_else(|| QuizError::not_found("Quiz attempt"))?;

    let answers = store.list_answers(attempt.id).await?;
    Ok(AttemptView::new(attempt, answers))
}

/// Every attempt made by the calling student, newest first.
pub async fn list_my_attempts(
    store: &dyn QuizStore,
    caller: &Caller,
) -> Result<Vec<QuizAttempt>, QuizError> {
    let student = require_student(caller, "list their attempts")?;
    Ok(store.list_attempts_by_student(student.id).await?)
}

/// Every attempt at a quiz, for the teacher who authored it.
pub async fn list_quiz_attempts(
    store: &dyn QuizStore,
    quiz_id: QuizId,
    caller: &Caller,
) -> Result<Vec<QuizAttempt>, QuizError> {
    let teacher = require_teacher(caller, "list attempts at a quiz")?;

    let quiz = store
        .get_quiz(quiz_id)
        .await?
        .ok_or_else(|| QuizError::not_found("Quiz"))?;

    if !quiz.is_owned_by(teacher.id) {
        return Err(QuizError::forbidden("Quiz belongs to another teacher"));
    }

    Ok(store.list_attempts_by_quiz(quiz.id).await?)
}
