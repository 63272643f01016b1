// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{AnswerId, AttemptId, OptionId, QuestionId, QuizId, StudentId};

/// Represents the 'quiz_attempts' table in the database.
/// At most one row exists per (student, quiz).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: AttemptId,
    pub student_id: StudentId,
    pub quiz_id: QuizId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub is_completed: bool,
    /// Only authoritative once `is_completed` is true.
    pub marks_obtained: i64,
}

/// Lifecycle of an attempt. There is no transition out of `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    InProgress,
    Completed,
}

impl QuizAttempt {
    /// A fresh, in-progress attempt.
    pub fn begin(student_id: StudentId, quiz_id: QuizId, now: DateTime<Utc>) -> Self {
        Self {
            id: AttemptId::generate(),
            student_id,
            quiz_id,
            started_at: now,
            ended_at: None,
            is_completed: false,
            marks_obtained: 0,
        }
    }

    pub fn state(&self) -> AttemptState {
        if self.is_completed {
            AttemptState::Completed
        } else {
            AttemptState::InProgress
        }
    }

    /// Seconds between start and submission; `None` while in progress.
    pub fn duration_seconds(&self) -> Option<i64> {
        self.ended_at
            .map(|ended| (ended - self.started_at).num_seconds())
    }
}

/// Represents the 'answer_records' table in the database.
/// At most one row exists per (attempt, question).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub id: AnswerId,
    pub attempt_id: AttemptId,
    pub question_id: QuestionId,
    pub selected_option_id: Option<OptionId>,
    /// Computed when the answer is written.
    pub marks_awarded: i32,
    pub answered_at: DateTime<Utc>,
}

/// Attempt together with its recorded answers.
#[derive(Debug, Serialize)]
pub struct AttemptView {
    #[serde(flatten)]
    pub attempt: QuizAttempt,
    pub state: AttemptState,
    pub duration_seconds: Option<i64>,
    pub answers: Vec<AnswerRecord>,
}

impl AttemptView {
    pub fn new(attempt: QuizAttempt, answers: Vec<AnswerRecord>) -> Self {
        Self {
            state: attempt.state(),
            duration_seconds: attempt.duration_seconds(),
            attempt,
            answers,
        }
    }
}

/// DTO for recording one answer.
#[derive(Debug, Deserialize)]
pub struct RecordAnswerRequest {
    pub attempt_id: AttemptId,
    pub question_id: QuestionId,
    /// `null` records an explicit blank answer.
    #[serde(default)]
    pub selected_option_id: Option<OptionId>,
}
