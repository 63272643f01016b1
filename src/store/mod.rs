// src/store/mod.rs

//! Persistence seam for quizzes, attempts and answers.
//!
//! Every method is one bounded unit of work. Methods that must be atomic
//! relative to concurrent callers (attempt creation, answer upsert and
//! attempt finalization) run inside a single storage transaction and lean
//! on the unique constraints of the schema rather than read-then-write checks.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{
    attempt::{AnswerRecord, QuizAttempt},
    id::{AttemptId, OptionId, QuestionId, QuizId, SectionId, StudentId, TeacherId},
    question::{Question, QuestionOption},
    quiz::Quiz,
};

pub use memory::MemoryQuizStore;
pub use postgres::PgQuizStore;

/// Name of the unique constraint on (student, quiz).
pub const ATTEMPT_UNIQUE_CONSTRAINT: &str = "quiz_attempts_student_quiz_key";

/// Name of the unique constraint on (attempt, question).
pub const ANSWER_UNIQUE_CONSTRAINT: &str = "answer_records_attempt_question_key";

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write. Carries the constraint name.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// The attempt was already finalized when the write ran.
    #[error("attempt is completed")]
    Completed,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Folds the answer records of an attempt into its final score.
pub type ScoreFn = fn(&[AnswerRecord]) -> i64;

#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn insert_quiz(&self, quiz: &Quiz) -> StoreResult<()>;
    async fn get_quiz(&self, id: QuizId) -> StoreResult<Option<Quiz>>;
    async fn list_quizzes_by_teacher(&self, teacher_id: TeacherId) -> StoreResult<Vec<Quiz>>;
    /// Quizzes assigned to `section`, plus quizzes open to every section.
    async fn list_quizzes_for_section(&self, section: Option<SectionId>)
    -> StoreResult<Vec<Quiz>>;

    async fn insert_question(&self, question: &Question) -> StoreResult<()>;
    async fn get_question(&self, id: QuestionId) -> StoreResult<Option<Question>>;
    /// Questions of a quiz in display order.
    async fn list_questions(&self, quiz_id: QuizId) -> StoreResult<Vec<Question>>;

    /// Inserts an option, optionally making it its question's correct option
    /// in the same transaction.
    async fn insert_option(&self, option: &QuestionOption, mark_correct: bool) -> StoreResult<()>;
    async fn get_option(&self, id: OptionId) -> StoreResult<Option<QuestionOption>>;
    /// Options of every question in a quiz, in creation order.
    async fn list_options_for_quiz(&self, quiz_id: QuizId) -> StoreResult<Vec<QuestionOption>>;
    /// Fails with `NotFound("Option")` unless the option belongs to the question.
    async fn set_correct_option(
        &self,
        question_id: QuestionId,
        option_id: OptionId,
    ) -> StoreResult<Question>;

    /// Fails with `UniqueViolation` when the student already has an attempt.
    async fn create_attempt(&self, attempt: &QuizAttempt) -> StoreResult<()>;
    async fn get_attempt(&self, id: AttemptId) -> StoreResult<Option<QuizAttempt>>;
    async fn find_attempt(
        &self,
        student_id: StudentId,
        quiz_id: QuizId,
    ) -> StoreResult<Option<QuizAttempt>>;
    async fn list_attempts_by_student(&self, student_id: StudentId)
    -> StoreResult<Vec<QuizAttempt>>;
    async fn list_attempts_by_quiz(&self, quiz_id: QuizId) -> StoreResult<Vec<QuizAttempt>>;

    async fn list_answers(&self, attempt_id: AttemptId) -> StoreResult<Vec<AnswerRecord>>;

    /// Inserts or replaces the answer for (attempt, question).
    ///
    /// Fails with `Completed` if the attempt is finalized at the moment the
    /// write takes its lock. On conflict the existing record keeps its id.
    async fn upsert_answer(&self, answer: &AnswerRecord) -> StoreResult<AnswerRecord>;

    /// Scores and completes an attempt in one transaction.
    ///
    /// Answers are read while holding the attempt lock, so no answer can land
    /// between aggregation and completion. Fails with `Completed` if the
    /// attempt is already finalized.
    async fn finalize_attempt(
        &self,
        attempt_id: AttemptId,
        ended_at: DateTime<Utc>,
        score: ScoreFn,
    ) -> StoreResult<QuizAttempt>;
}
