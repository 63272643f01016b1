// src/services/availability.rs

use chrono::{DateTime, Utc};

use crate::models::quiz::Quiz;

/// Whether `now` falls inside the quiz window, both ends inclusive.
///
/// Only attempt creation is gated on this. An attempt started in time may
/// still record answers and be submitted after the window closes.
pub fn is_active(quiz: &Quiz, now: DateTime<Utc>) -> bool {
    quiz.start_time <= now && now <= quiz.end_time
}
