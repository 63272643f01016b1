// src/models/caller.rs

use serde::{Deserialize, Serialize};

use super::id::{SectionId, StudentId, TeacherId};

/// Student profile reference resolved from the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRef {
    pub id: StudentId,
    /// Section the student is enrolled in, if any.
    pub section: Option<SectionId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherRef {
    pub id: TeacherId,
}

/// The authenticated principal behind a request.
///
/// Every operation pattern-matches on this instead of comparing role strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Student(StudentRef),
    Teacher(TeacherRef),
}

impl Caller {
    pub fn student(id: StudentId, section: Option<SectionId>) -> Self {
        Caller::Student(StudentRef { id, section })
    }

    pub fn teacher(id: TeacherId) -> Self {
        Caller::Teacher(TeacherRef { id })
    }

    pub fn role(&self) -> &'static str {
        match self {
            Caller::Student(_) => "student",
            Caller::Teacher(_) => "teacher",
        }
    }
}
