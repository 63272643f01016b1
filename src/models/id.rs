// src/models/id.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares an opaque 128-bit identifier newtype.
///
/// Ids are random (UUID v4) so they cannot be guessed or enumerated across
/// quizzes. Each entity gets its own type so a `QuestionId` can never be
/// passed where an `OptionId` is expected.
macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random id.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

opaque_id!(QuizId);
opaque_id!(QuestionId);
opaque_id!(OptionId);
opaque_id!(AttemptId);
opaque_id!(AnswerId);
opaque_id!(StudentId);
opaque_id!(TeacherId);
opaque_id!(
    /// Reference into the external academic-structure catalog.
    SubjectId
);
opaque_id!(
    /// Reference into the external academic-structure catalog.
    SectionId
);
