// src/services/catalog.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use validator::Validate;

use super::{availability, require_teacher};
use crate::{
    error::QuizError,
    models::{
        caller::{Caller, TeacherRef},
        id::{OptionId, QuestionId, QuizId},
        question::{
            CreateOptionRequest, CreateQuestionRequest, PublicQuestion, Question, QuestionOption,
        },
        quiz::{CreateQuizRequest, Quiz, QuizDetail, QuizSummary},
    },
    store::QuizStore,
    utils::html::clean_html,
};

/// Loads a quiz the teacher is allowed to edit.
async fn owned_quiz(
    store: &dyn QuizStore,
    quiz_id: QuizId,
    teacher: &TeacherRef,
) -> Result<Quiz, QuizError> {
    let quiz = store
        .get_quiz(quiz_id)
        .await?
        .ok_or_else(|| QuizError::not_found("Quiz"))?;

    if !quiz.is_owned_by(teacher.id) {
        return Err(QuizError::forbidden("Quiz belongs to another teacher"));
    }
    Ok(quiz)
}

/// Loads a question whose quiz the teacher is allowed to edit.
async fn owned_question(
    store: &dyn QuizStore,
    question_id: QuestionId,
    teacher: &TeacherRef,
) -> Result<Question, QuizError> {
    let question = store
        .get_question(question_id)
        .await?
        .ok_or_else(|| QuizError::not_found("Question"))?;

    owned_quiz(store, question.quiz_id, teacher).await?;
    Ok(question)
}

pub async fn create_quiz(
    store: &dyn QuizStore,
    caller: &Caller,
    req: CreateQuizRequest,
    now: DateTime<Utc>,
) -> Result<Quiz, QuizError> {
    let teacher = require_teacher(caller, "create quizzes")?;
    req.validate()?;

    if req.start_time >= req.end_time {
        return Err(QuizError::Invalid(
            "start_time must be before end_time".to_string(),
        ));
    }

    let mut sections = req.sections;
    sections.sort();
    sections.dedup();

    let quiz = Quiz {
        id: QuizId::generate(),
        title: req.title.trim().to_string(),
        description: clean_html(&req.description),
        subject_id: req.subject_id,
        teacher_id: teacher.id,
        sections,
        total_marks: req.total_marks,
        time_limit_minutes: req.time_limit_minutes,
        instructions: clean_html(&req.instructions),
        due_date: req.due_date,
        start_time: req.start_time,
        end_time: req.end_time,
        is_proctored: req.is_proctored,
        created_at: now,
    };

    store.insert_quiz(&quiz).await?;
    tracing::info!("Teacher {} created quiz {}", teacher.id, quiz.id);

    Ok(quiz)
}

pub async fn add_question(
    store: &dyn QuizStore,
    quiz_id: QuizId,
    caller: &Caller,
    req: CreateQuestionRequest,
    now: DateTime<Utc>,
) -> Result<Question, QuizError> {
    let teacher = require_teacher(caller, "add questions")?;
    req.validate()?;
    let quiz = owned_quiz(store, quiz_id, teacher).await?;

    let question = Question {
        id: QuestionId::generate(),
        quiz_id: quiz.id,
        text: clean_html(&req.text),
        question_type: req.question_type,
        image_url: req.image_url,
        correct_option: None,
        marks: req.marks,
        position: req.position,
        created_at: now,
    };

    store.insert_question(&question).await?;
    Ok(question)
}

pub async fn add_option(
    store: &dyn QuizStore,
    question_id: QuestionId,
    caller: &Caller,
    req: CreateOptionRequest,
) -> Result<QuestionOption, QuizError> {
    let teacher = require_teacher(caller, "add options")?;
    req.validate()?;
    let question = owned_question(store, question_id, teacher).await?;

    let option = QuestionOption {
        id: OptionId::generate(),
        question_id: question.id,
        text: clean_html(&req.text),
    };

    store.insert_option(&option, req.is_correct).await?;
    Ok(option)
}

/// Designates the correct option of a question.
/// The option must be one of the question's own options.
pub async fn set_correct_option(
    store: &dyn QuizStore,
    question_id: QuestionId,
    option_id: OptionId,
    caller: &Caller,
) -> Result<Question, QuizError> {
    let teacher = require_teacher(caller, "set correct options")?;
    let question = owned_question(store, question_id, teacher).await?;

    let option = store
        .get_option(option_id)
        .await?
        .ok_or_else(|| QuizError::not_found("Option"))?;

    if option.question_id != question.id {
        return Err(QuizError::Invalid(
            "Option does not belong to this question".to_string(),
        ));
    }

    Ok(store.set_correct_option(question.id, option.id).await?)
}

/// Quizzes the caller can see: a teacher's own, or those assigned to a
/// student's section.
pub async fn list_quizzes(
    store: &dyn QuizStore,
    caller: &Caller,
    now: DateTime<Utc>,
) -> Result<Vec<QuizSummary>, QuizError> {
    let quizzes = match caller {
        Caller::Teacher(teacher) => store.list_quizzes_by_teacher(teacher.id).await?,
        Caller::Student(student) => store.list_quizzes_for_section(student.section).await?,
    };

    Ok(quizzes
        .into_iter()
        .map(|quiz| QuizSummary {
            is_active: availability::is_active(&quiz, now),
            quiz,
        })
        .collect())
}

/// Quiz with its questions in display order.
///
/// Only the authoring teacher sees which option is correct.
pub async fn get_quiz(
    store: &dyn QuizStore,
    quiz_id: QuizId,
    caller: &Caller,
    now: DateTime<Utc>,
) -> Result<QuizDetail, QuizError> {
    let quiz = store
        .get_quiz(quiz_id)
        .await?
        .filter(|q| q.is_visible_to(caller))
        .ok_or_else(|| QuizError::not_found("Quiz"))?;

    let reveal_answers = matches!(caller, Caller::Teacher(t) if quiz.is_owned_by(t.id));

    let questions = store.list_questions(quiz.id).await?;
    let mut options_by_question: HashMap<QuestionId, Vec<QuestionOption>> = HashMap::new();
    for option in store.list_options_for_quiz(quiz.id).await? {
        options_by_question
            .entry(option.question_id)
            .or_default()
            .push(option);
    }

    let questions = questions
        .into_iter()
        .map(|q| PublicQuestion {
            options: options_by_question.remove(&q.id).unwrap_or_default(),
            correct_option: if reveal_answers { q.correct_option } else { None },
            id: q.id,
            text: q.text,
            question_type: q.question_type,
            image_url: q.image_url,
            marks: q.marks,
            position: q.position,
        })
        .collect();

    Ok(QuizDetail {
        is_active: availability::is_active(&quiz, now),
        quiz,
        questions,
    })
}
