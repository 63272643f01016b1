// src/services/scoring.rs

use crate::models::attempt::AnswerRecord;

/// Final score of an attempt: the sum of its per-answer marks.
///
/// Runs inside the finalize transaction, so `answers` is a consistent
/// snapshot of every answer recorded before submission.
pub fn compute_score(answers: &[AnswerRecord]) -> i64 {
    answers.iter().map(|a| i64::from(a.marks_awarded)).sum()
}
