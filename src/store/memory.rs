// src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{ATTEMPT_UNIQUE_CONSTRAINT, QuizStore, ScoreFn, StoreError, StoreResult};
use crate::models::{
    attempt::{AnswerRecord, QuizAttempt},
    id::{AttemptId, OptionId, QuestionId, QuizId, SectionId, StudentId, TeacherId},
    question::{Question, QuestionOption},
    quiz::Quiz,
};

#[derive(Default)]
struct Tables {
    quizzes: HashMap<QuizId, Quiz>,
    questions: HashMap<QuestionId, Question>,
    options: Vec<QuestionOption>,
    attempts: HashMap<AttemptId, QuizAttempt>,
    answers: Vec<AnswerRecord>,
}

/// In-process store.
///
/// Every call holds the table lock for its whole duration, so each method is
/// serialized against all others the same way a transaction would be.
#[derive(Default)]
pub struct MemoryQuizStore {
    tables: RwLock<Tables>,
}

impl MemoryQuizStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_quizzes<'a>(quizzes: impl Iterator<Item = &'a Quiz>) -> Vec<Quiz> {
    let mut items: Vec<Quiz> = quizzes.cloned().collect();
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    items
}

fn sorted_attempts<'a>(attempts: impl Iterator<Item = &'a QuizAttempt>) -> Vec<QuizAttempt> {
    let mut items: Vec<QuizAttempt> = attempts.cloned().collect();
    items.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(a.id.cmp(&b.id)));
    items
}

#[async_trait]
impl QuizStore for MemoryQuizStore {
    async fn insert_quiz(&self, quiz: &Quiz) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.quizzes.contains_key(&quiz.id) {
            return Err(StoreError::UniqueViolation("quizzes_pkey".to_string()));
        }
        tables.quizzes.insert(quiz.id, quiz.clone());
        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> StoreResult<Option<Quiz>> {
        let tables = self.tables.read().await;
        Ok(tables.quizzes.get(&id).cloned())
    }

    async fn list_quizzes_by_teacher(&self, teacher_id: TeacherId) -> StoreResult<Vec<Quiz>> {
        let tables = self.tables.read().await;
        Ok(sorted_quizzes(
            tables.quizzes.values().filter(|q| q.teacher_id == teacher_id),
        ))
    }

    async fn list_quizzes_for_section(
        &self,
        section: Option<SectionId>,
    ) -> StoreResult<Vec<Quiz>> {
        let tables = self.tables.read().await;
        Ok(sorted_quizzes(tables.quizzes.values().filter(|q| {
            q.sections.is_empty() || section.is_some_and(|s| q.sections.contains(&s))
        })))
    }

    async fn insert_question(&self, question: &Question) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.quizzes.contains_key(&question.quiz_id) {
            return Err(StoreError::NotFound("Quiz"));
        }
        tables.questions.insert(question.id, question.clone());
        Ok(())
    }

    async fn get_question(&self, id: QuestionId) -> StoreResult<Option<Question>> {
        let tables = self.tables.read().await;
        Ok(tables.questions.get(&id).cloned())
    }

    async fn list_questions(&self, quiz_id: QuizId) -> StoreResult<Vec<Question>> {
        let tables = self.tables.read().await;
        let mut items: Vec<Question> = tables
            .questions
            .values()
            .filter(|q| q.quiz_id == quiz_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        Ok(items)
    }

    async fn insert_option(&self, option: &QuestionOption, mark_correct: bool) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let question = tables
            .questions
            .get_mut(&option.question_id)
            .ok_or(StoreError::NotFound("Question"))?;
        if mark_correct {
            question.correct_option = Some(option.id);
        }
        tables.options.push(option.clone());
        Ok(())
    }

    async fn get_option(&self, id: OptionId) -> StoreResult<Option<QuestionOption>> {
        let tables = self.tables.read().await;
        Ok(tables.options.iter().find(|o| o.id == id).cloned())
    }

    async fn list_options_for_quiz(&self, quiz_id: QuizId) -> StoreResult<Vec<QuestionOption>> {
        let tables = self.tables.read().await;
        Ok(tables
            .options
            .iter()
            .filter(|o| {
                tables
                    .questions
                    .get(&o.question_id)
                    .is_some_and(|q| q.quiz_id == quiz_id)
            })
            .cloned()
            .collect())
    }

    async fn set_correct_option(
        &self,
        question_id: QuestionId,
        option_id: OptionId,
    ) -> StoreResult<Question> {
        let mut tables = self.tables.write().await;
        let belongs = tables
            .options
            .iter()
            .any(|o| o.id == option_id && o.question_id == question_id);
        if !belongs {
            return Err(StoreError::NotFound("Option"));
        }
        let question = tables
            .questions
            .get_mut(&question_id)
            .ok_or(StoreError::NotFound("Question"))?;
        question.correct_option = Some(option_id);
        Ok(question.clone())
    }

    async fn create_attempt(&self, attempt: &QuizAttempt) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let duplicate = tables
            .attempts
            .values()
            .any(|a| a.student_id == attempt.student_id && a.quiz_id == attempt.quiz_id);
        if duplicate {
            return Err(StoreError::UniqueViolation(
                ATTEMPT_UNIQUE_CONSTRAINT.to_string(),
            ));
        }
        tables.attempts.insert(attempt.id, attempt.clone());
        Ok(())
    }

    async fn get_attempt(&self, id: AttemptId) -> StoreResult<Option<QuizAttempt>> {
        let tables = self.tables.read().await;
        Ok(tables.attempts.get(&id).cloned())
    }

    async fn find_attempt(
        &self,
        student_id: StudentId,
        quiz_id: QuizId,
    ) -> StoreResult<Option<QuizAttempt>> {
        let tables = self.tables.read().await;
        Ok(tables
            .attempts
            .values()
            .find(|a| a.student_id == student_id && a.quiz_id == quiz_id)
            .cloned())
    }

    async fn list_attempts_by_student(
        &self,
        student_id: StudentId,
    ) -> StoreResult<Vec<QuizAttempt>> {
        let tables = self.tables.read().await;
        Ok(sorted_attempts(
            tables.attempts.values().filter(|a| a.student_id == student_id),
        ))
    }

    async fn list_attempts_by_quiz(&self, quiz_id: QuizId) -> StoreResult<Vec<QuizAttempt>> {
        let tables = self.tables.read().await;
        Ok(sorted_attempts(
            tables.attempts.values().filter(|a| a.quiz_id == quiz_id),
        ))
    }

    async fn list_answers(&self, attempt_id: AttemptId) -> StoreResult<Vec<AnswerRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .answers
            .iter()
            .filter(|a| a.attempt_id == attempt_id)
            .cloned()
            .collect())
    }

    async fn upsert_answer(&self, answer: &AnswerRecord) -> StoreResult<AnswerRecord> {
        let mut tables = self.tables.write().await;
        let attempt = tables
            .attempts
            .get(&answer.attempt_id)
            .ok_or(StoreError::NotFound("Attempt"))?;
        if attempt.is_completed {
            return Err(StoreError::Completed);
        }

        let existing = tables
            .answers
            .iter()
            .position(|a| a.attempt_id == answer.attempt_id && a.question_id == answer.question_id);
        match existing {
            Some(index) => {
                let record = &mut tables.answers[index];
                record.selected_option_id = answer.selected_option_id;
                record.marks_awarded = answer.marks_awarded;
                record.answered_at = answer.answered_at;
                Ok(record.clone())
            }
            None => {
                tables.answers.push(answer.clone());
                Ok(answer.clone())
            }
        }
    }

    async fn finalize_attempt(
        &self,
        attempt_id: AttemptId,
        ended_at: DateTime<Utc>,
        score: ScoreFn,
    ) -> StoreResult<QuizAttempt> {
        let mut tables = self.tables.write().await;
        let answers: Vec<AnswerRecord> = tables
            .answers
            .iter()
            .filter(|a| a.attempt_id == attempt_id)
            .cloned()
            .collect();

        let attempt = tables
            .attempts
            .get_mut(&attempt_id)
            .ok_or(StoreError::NotFound("Attempt"))?;
        if attempt.is_completed {
            return Err(StoreError::Completed);
        }

        attempt.marks_obtained = score(&answers);
        attempt.ended_at = Some(ended_at);
        attempt.is_completed = true;
        Ok(attempt.clone())
    }
}
