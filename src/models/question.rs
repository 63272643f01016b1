// src/models/question.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::id::{OptionId, QuestionId, QuizId};

/// Supported question kinds. Only single-select multiple choice is graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    #[default]
    MultipleChoice,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "multiple_choice" => Some(QuestionType::MultipleChoice),
            _ => None,
        }
    }
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub quiz_id: QuizId,
    pub text: String,
    pub question_type: QuestionType,
    pub image_url: Option<String>,

    /// The option that earns full marks. Always one of this question's own options.
    pub correct_option: Option<OptionId>,

    /// Marks awarded for a correct answer. Always positive.
    pub marks: i32,

    /// Display order within the quiz. Not unique.
    pub position: i32,

    pub created_at: DateTime<Utc>,
}

/// Represents the 'question_options' table in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: OptionId,
    pub question_id: QuestionId,
    pub text: String,
}

/// DTO for sending a question to the client.
/// `correct_option` is only filled in for the quiz's author.
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: QuestionId,
    pub text: String,
    pub question_type: QuestionType,
    pub image_url: Option<String>,
    pub marks: i32,
    pub position: i32,
    pub options: Vec<QuestionOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<OptionId>,
}

/// DTO for adding a question to a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
    #[serde(default)]
    pub question_type: QuestionType,
    #[validate(length(max = 2048))]
    pub image_url: Option<String>,
    #[validate(range(min = 1, max = 1000))]
    pub marks: i32,
    #[serde(default)]
    pub position: i32,
}

/// DTO for adding an option to a question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOptionRequest {
    #[validate(length(min = 1, max = 500))]
    pub text: String,
    /// Marks this option as the question's correct answer.
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetCorrectOptionRequest {
    pub option_id: OptionId,
}
