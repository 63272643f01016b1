// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    caller::Caller,
    id::{QuizId, SectionId, SubjectId, TeacherId},
    question::PublicQuestion,
};

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: QuizId,
    pub title: String,
    pub description: String,
    pub subject_id: SubjectId,
    /// Teacher who authored the quiz. Only this teacher may edit it.
    pub teacher_id: TeacherId,
    /// Sections whose students may take the quiz.
    pub sections: Vec<SectionId>,
    pub total_marks: i32,
    pub time_limit_minutes: i32,
    pub instructions: String,
    pub due_date: Option<DateTime<Utc>>,
    /// Opening of the availability window (inclusive).
    pub start_time: DateTime<Utc>,
    /// Closing of the availability window (inclusive). Always after `start_time`.
    pub end_time: DateTime<Utc>,
    pub is_proctored: bool,
    pub created_at: DateTime<Utc>,
}

impl Quiz {
    pub fn is_owned_by(&self, teacher_id: TeacherId) -> bool {
        self.teacher_id == teacher_id
    }

    /// Whether the caller can see this quiz at all.
    ///
    /// Teachers see the quizzes they authored. Students see quizzes assigned
    /// to their section; a quiz without sections is open to every student.
    pub fn is_visible_to(&self, caller: &Caller) -> bool {
        match caller {
            Caller::Teacher(teacher) => self.is_owned_by(teacher.id),
            Caller::Student(student) => {
                self.sections.is_empty()
                    || student
                        .section
                        .is_some_and(|section| self.sections.contains(&section))
            }
        }
    }
}

/// Quiz with its questions, as returned by the detail endpoint.
#[derive(Debug, Serialize)]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub is_active: bool,
    pub questions: Vec<PublicQuestion>,
}

/// Quiz row in list responses.
#[derive(Debug, Serialize)]
pub struct QuizSummary {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub is_active: bool,
}

/// DTO for a teacher creating a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    pub subject_id: SubjectId,
    #[serde(default)]
    pub sections: Vec<SectionId>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub total_marks: i32,
    #[validate(range(min = 1, max = 1440))]
    pub time_limit_minutes: i32,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub instructions: String,
    pub due_date: Option<DateTime<Utc>>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub is_proctored: bool,
}
