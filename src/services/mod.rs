// src/services/mod.rs

//! Quiz operations. Each function takes the store explicitly and performs one
//! request's worth of work against it; nothing here holds state between calls.

pub mod answers;
pub mod attempts;
pub mod availability;
pub mod catalog;
pub mod scoring;

use crate::{
    error::QuizError,
    models::caller::{Caller, StudentRef, TeacherRef},
};

fn require_student<'a>(caller: &'a Caller, action: &str) -> Result<&'a StudentRef, QuizError> {
    match caller {
        Caller::Student(student) => Ok(student),
        Caller::Teacher(_) => Err(QuizError::Forbidden(format!(
            "Only students can {}",
            action
        ))),
    }
}

fn require_teacher<'a>(caller: &'a Caller, action: &str) -> Result<&'a TeacherRef, QuizError> {
    match caller {
        Caller::Teacher(teacher) => Ok(teacher),
        Caller::Student(_) => Err(QuizError::Forbidden(format!(
            "Only teachers can {}",
            action
        ))),
    }
}
