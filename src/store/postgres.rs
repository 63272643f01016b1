// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{ANSWER_UNIQUE_CONSTRAINT, QuizStore, ScoreFn, StoreError, StoreResult};
use crate::models::{
    attempt::{AnswerRecord, QuizAttempt},
    id::{AttemptId, OptionId, QuestionId, QuizId, SectionId, StudentId, TeacherId},
    question::{Question, QuestionOption, QuestionType},
    quiz::Quiz,
};

const QUIZ_COLUMNS: &str = "id, title, description, subject_id, teacher_id, section_ids, \
     total_marks, time_limit_minutes, instructions, due_date, start_time, end_time, \
     is_proctored, created_at";

const QUESTION_COLUMNS: &str =
    "id, quiz_id, text, question_type, image_url, correct_option_id, marks, position, created_at";

const ATTEMPT_COLUMNS: &str =
    "id, student_id, quiz_id, started_at, ended_at, is_completed, marks_obtained";

const ANSWER_COLUMNS: &str =
    "id, attempt_id, question_id, selected_option_id, marks_awarded, answered_at";

/// Postgres-backed store.
///
/// Uniqueness of attempts and answers is enforced by the schema in
/// `migrations/`; this type only translates constraint failures.
#[derive(Clone)]
pub struct PgQuizStore {
    pool: PgPool,
}

impl PgQuizStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw row of the 'quizzes' table.
#[derive(FromRow)]
struct QuizRow {
    id: Uuid,
    title: String,
    description: String,
    subject_id: Uuid,
    teacher_id: Uuid,
    section_ids: Vec<Uuid>,
    total_marks: i32,
    time_limit_minutes: i32,
    instructions: String,
    due_date: Option<DateTime<Utc>>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    is_proctored: bool,
    created_at: DateTime<Utc>,
}

impl From<QuizRow> for Quiz {
    fn from(row: QuizRow) -> Self {
        Quiz {
            id: row.id.into(),
            title: row.title,
            description: row.description,
            subject_id: row.subject_id.into(),
            teacher_id: row.teacher_id.into(),
            sections: row.section_ids.into_iter().map(SectionId::from).collect(),
            total_marks: row.total_marks,
            time_limit_minutes: row.time_limit_minutes,
            instructions: row.instructions,
            due_date: row.due_date,
            start_time: row.start_time,
            end_time: row.end_time,
            is_proctored: row.is_proctored,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct QuestionRow {
    id: Uuid,
    quiz_id: Uuid,
    text: String,
    question_type: String,
    image_url: Option<String>,
    correct_option_id: Option<Uuid>,
    marks: i32,
    position: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = StoreError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let question_type = QuestionType::parse(&row.question_type).ok_or_else(|| {
            StoreError::Database(sqlx::Error::ColumnDecode {
                index: "question_type".to_string(),
                source: format!("unknown question type '{}'", row.question_type).into(),
            })
        })?;

        Ok(Question {
            id: row.id.into(),
            quiz_id: row.quiz_id.into(),
            text: row.text,
            question_type,
            image_url: row.image_url,
            correct_option: row.correct_option_id.map(OptionId::from),
            marks: row.marks,
            position: row.position,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct OptionRow {
    id: Uuid,
    question_id: Uuid,
    text: String,
}

impl From<OptionRow> for QuestionOption {
    fn from(row: OptionRow) -> Self {
        QuestionOption {
            id: row.id.into(),
            question_id: row.question_id.into(),
            text: row.text,
        }
    }
}

#[derive(FromRow)]
struct AttemptRow {
    id: Uuid,
    student_id: Uuid,
    quiz_id: Uuid,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    is_completed: bool,
    marks_obtained: i64,
}

impl From<AttemptRow> for QuizAttempt {
    fn from(row: AttemptRow) -> Self {
        QuizAttempt {
            id: row.id.into(),
            student_id: row.student_id.into(),
            quiz_id: row.quiz_id.into(),
            started_at: row.started_at,
            ended_at: row.ended_at,
            is_completed: row.is_completed,
            marks_obtained: row.marks_obtained,
        }
    }
}

#[derive(FromRow)]
struct AnswerRow {
    id: Uuid,
    attempt_id: Uuid,
    question_id: Uuid,
    selected_option_id: Option<Uuid>,
    marks_awarded: i32,
    answered_at: DateTime<Utc>,
}

impl From<AnswerRow> for AnswerRecord {
    fn from(row: AnswerRow) -> Self {
        AnswerRecord {
            id: row.id.into(),
            attempt_id: row.attempt_id.into(),
            question_id: row.question_id.into(),
            selected_option_id: row.selected_option_id.map(OptionId::from),
            marks_awarded: row.marks_awarded,
            answered_at: row.answered_at,
        }
    }
}

/// Translates a unique violation into `StoreError::UniqueViolation`.
/// Any other database failure is passed through.
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            return StoreError::UniqueViolation(constraint);
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl QuizStore for PgQuizStore {
    async fn insert_quiz(&self, quiz: &Quiz) -> StoreResult<()> {
        let section_ids: Vec<Uuid> = quiz.sections.iter().map(|s| s.as_uuid()).collect();

        sqlx::query(
            r#"
            INSERT INTO quizzes (
                id, title, description, subject_id, teacher_id, section_ids,
                total_marks, time_limit_minutes, instructions, due_date,
                start_time, end_time, is_proctored, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(quiz.id.as_uuid())
        .bind(&quiz.title)
        .bind(&quiz.description)
        .bind(quiz.subject_id.as_uuid())
        .bind(quiz.teacher_id.as_uuid())
        .bind(section_ids)
        .bind(quiz.total_marks)
        .bind(quiz.time_limit_minutes)
        .bind(&quiz.instructions)
        .bind(quiz.due_date)
        .bind(quiz.start_time)
        .bind(quiz.end_time)
        .bind(quiz.is_proctored)
        .bind(quiz.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> StoreResult<Option<Quiz>> {
        let row = sqlx::query_as::<_, QuizRow>(&format!(
            "SELECT {} FROM quizzes WHERE id = $1",
            QUIZ_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Quiz::from))
    }

    async fn list_quizzes_by_teacher(&self, teacher_id: TeacherId) -> StoreResult<Vec<Quiz>> {
        let rows = sqlx::query_as::<_, QuizRow>(&format!(
            "SELECT {} FROM quizzes WHERE teacher_id = $1 ORDER BY created_at DESC, id",
            QUIZ_COLUMNS
        ))
        .bind(teacher_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Quiz::from).collect())
    }

    async fn list_quizzes_for_section(
        &self,
        section: Option<SectionId>,
    ) -> StoreResult<Vec<Quiz>> {
        let rows = sqlx::query_as::<_, QuizRow>(&format!(
            r#"
            SELECT {} FROM quizzes
            WHERE cardinality(section_ids) = 0 OR $1 = ANY(section_ids)
            ORDER BY created_at DESC, id
            "#,
            QUIZ_COLUMNS
        ))
        .bind(section.map(|s| s.as_uuid()))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Quiz::from).collect())
    }

    async fn insert_question(&self, question: &Question) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO questions (
                id, quiz_id, text, question_type, image_url,
                correct_option_id, marks, position, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(question.id.as_uuid())
        .bind(question.quiz_id.as_uuid())
        .bind(&question.text)
        .bind(question.question_type.as_str())
        .bind(&question.image_url)
        .bind(question.correct_option.map(|o| o.as_uuid()))
        .bind(question.marks)
        .bind(question.position)
        .bind(question.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn get_question(&self, id: QuestionId) -> StoreResult<Option<Question>> {
        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {} FROM questions WHERE id = $1",
            QUESTION_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Question::try_from).transpose()
    }

    async fn list_questions(&self, quiz_id: QuizId) -> StoreResult<Vec<Question>> {
        let rows = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {} FROM questions WHERE quiz_id = $1 ORDER BY position, created_at, id",
            QUESTION_COLUMNS
        ))
        .bind(quiz_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Question::try_from).collect()
    }

    async fn insert_option(&self, option: &QuestionOption, mark_correct: bool) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO question_options (id, question_id, text) VALUES ($1, $2, $3)")
            .bind(option.id.as_uuid())
            .bind(option.question_id.as_uuid())
            .bind(&option.text)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?;

        if mark_correct {
            sqlx::query("UPDATE questions SET correct_option_id = $1 WHERE id = $2")
                .bind(option.id.as_uuid())
                .bind(option.question_id.as_uuid())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_option(&self, id: OptionId) -> StoreResult<Option<QuestionOption>> {
        let row = sqlx::query_as::<_, OptionRow>(
            "SELECT id, question_id, text FROM question_options WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(QuestionOption::from))
    }

    async fn list_options_for_quiz(&self, quiz_id: QuizId) -> StoreResult<Vec<QuestionOption>> {
        let rows = sqlx::query_as::<_, OptionRow>(
            r#"
            SELECT o.id, o.question_id, o.text
            FROM question_options o
            JOIN questions q ON q.id = o.question_id
            WHERE q.quiz_id = $1
            ORDER BY o.created_at, o.id
            "#,
        )
        .bind(quiz_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(QuestionOption::from).collect())
    }

    async fn set_correct_option(
        &self,
        question_id: QuestionId,
        option_id: OptionId,
    ) -> StoreResult<Question> {
        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            r#"
            UPDATE questions SET correct_option_id = $2
            WHERE id = $1
              AND EXISTS (
                  SELECT 1 FROM question_options
                  WHERE id = $2 AND question_id = $1
              )
            RETURNING {}
            "#,
            QUESTION_COLUMNS
        ))
        .bind(question_id.as_uuid())
        .bind(option_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("Option"))?;

        Question::try_from(row)
    }

    async fn create_attempt(&self, attempt: &QuizAttempt) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO quiz_attempts (
                id, student_id, quiz_id, started_at, ended_at, is_completed, marks_obtained
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(attempt.id.as_uuid())
        .bind(attempt.student_id.as_uuid())
        .bind(attempt.quiz_id.as_uuid())
        .bind(attempt.started_at)
        .bind(attempt.ended_at)
        .bind(attempt.is_completed)
        .bind(attempt.marks_obtained)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn get_attempt(&self, id: AttemptId) -> StoreResult<Option<QuizAttempt>> {
        let row = sqlx::query_as::<_, AttemptRow>(&format!(
            "SELECT {} FROM quiz_attempts WHERE id = $1",
            ATTEMPT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(QuizAttempt::from))
    }

    async fn find_attempt(
        &self,
        student_id: StudentId,
        quiz_id: QuizId,
    ) -> StoreResult<Option<QuizAttempt>> {
        let row = sqlx::query_as::<_, AttemptRow>(&format!(
            "SELECT {} FROM quiz_attempts WHERE student_id = $1 AND quiz_id = $2",
            ATTEMPT_COLUMNS
        ))
        .bind(student_id.as_uuid())
        .bind(quiz_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(QuizAttempt::from))
    }

    async fn list_attempts_by_student(
        &self,
        student_id: StudentId,
    ) -> StoreResult<Vec<QuizAttempt>> {
        let rows = sqlx::query_as::<_, AttemptRow>(&format!(
            "SELECT {} FROM quiz_attempts WHERE student_id = $1 ORDER BY started_at DESC, id",
            ATTEMPT_COLUMNS
        ))
        .bind(student_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(QuizAttempt::from).collect())
    }

    async fn list_attempts_by_quiz(&self, quiz_id: QuizId) -> StoreResult<Vec<QuizAttempt>> {
        let rows = sqlx::query_as::<_, AttemptRow>(&format!(
            "SELECT {} FROM quiz_attempts WHERE quiz_id = $1 ORDER BY started_at DESC, id",
            ATTEMPT_COLUMNS
        ))
        .bind(quiz_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(QuizAttempt::from).collect())
    }

    async fn list_answers(&self, attempt_id: AttemptId) -> StoreResult<Vec<AnswerRecord>> {
        let rows = sqlx::query_as::<_, AnswerRow>(&format!(
            "SELECT {} FROM answer_records WHERE attempt_id = $1 ORDER BY answered_at, id",
            ANSWER_COLUMNS
        ))
        .bind(attempt_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AnswerRecord::from).collect())
    }

    async fn upsert_answer(&self, answer: &AnswerRecord) -> StoreResult<AnswerRecord> {
        let mut tx = self.pool.begin().await?;

        // FOR SHARE conflicts with the FOR UPDATE taken by finalize_attempt.
        let completed: Option<bool> =
            sqlx::query_scalar("SELECT is_completed FROM quiz_attempts WHERE id = $1 FOR SHARE")
                .bind(answer.attempt_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;

        match completed {
            None => return Err(StoreError::NotFound("Attempt")),
            Some(true) => return Err(StoreError::Completed),
            Some(false) => {}
        }

        let row = sqlx::query_as::<_, AnswerRow>(&format!(
            r#"
            INSERT INTO answer_records (
                id, attempt_id, question_id, selected_option_id, marks_awarded, answered_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT ON CONSTRAINT {} DO UPDATE SET
                selected_option_id = EXCLUDED.selected_option_id,
                marks_awarded = EXCLUDED.marks_awarded,
                answered_at = EXCLUDED.answered_at
            RETURNING {}
            "#,
            ANSWER_UNIQUE_CONSTRAINT, ANSWER_COLUMNS
        ))
        .bind(answer.id.as_uuid())
        .bind(answer.attempt_id.as_uuid())
        .bind(answer.question_id.as_uuid())
        .bind(answer.selected_option_id.map(|o| o.as_uuid()))
        .bind(answer.marks_awarded)
        .bind(answer.answered_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn finalize_attempt(
        &self,
        attempt_id: AttemptId,
        ended_at: DateTime<Utc>,
        score: ScoreFn,
    ) -> StoreResult<QuizAttempt> {
        let mut tx = self.pool.begin().await?;

        let attempt = sqlx::query_as::<_, AttemptRow>(&format!(
            "SELECT {} FROM quiz_attempts WHERE id = $1 FOR UPDATE",
            ATTEMPT_COLUMNS
        ))
        .bind(attempt_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound("Attempt"))?;

        if attempt.is_completed {
            return Err(StoreError::Completed);
        }

        let answers: Vec<AnswerRecord> = sqlx::query_as::<_, AnswerRow>(&format!(
            "SELECT {} FROM answer_records WHERE attempt_id = $1",
            ANSWER_COLUMNS
        ))
        .bind(attempt_id.as_uuid())
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(AnswerRecord::from)
        .collect();

        let total = score(&answers);

        let row = sqlx::query_as::<_, AttemptRow>(&format!(
            r#"
            UPDATE quiz_attempts
            SET marks_obtained = $2, ended_at = $3, is_completed = TRUE
            WHERE id = $1
            RETURNING {}
            "#,
            ATTEMPT_COLUMNS
        ))
        .bind(attempt_id.as_uuid())
        .bind(total)
        .bind(ended_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }
}
