// src/grading/mod.rs

//! Quiz-attempt grading engine.
//!
//! Flow: [`attempt::submit_attempt`] checks eligibility, [`scorer::score`] walks
//! the quiz, [`grader::grade`] compares one answer, and [`normalize::normalize`]
//! canonicalizes both sides of every comparison.

pub mod attempt;
pub mod grader;
pub mod normalize;
pub mod scorer;
pub mod store;

use std::fmt;

pub use attempt::submit_attempt;
pub use grader::grade;
pub use normalize::normalize;
pub use scorer::{ScoreSheet, score};
pub use store::{GradingStore, MemoryGradingStore, PgGradingStore};

/// Why an attempt could not be recorded. None of these change any state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// Submitted outside the quiz's start/end window.
    QuizNotActive,

    /// The student already has an attempt for this quiz.
    DuplicateAttempt,

    /// No quiz with the requested id.
    QuizNotFound,

    /// The backing store failed.
    Storage(String),
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::QuizNotActive => write!(f, "quiz is not active"),
            AttemptError::DuplicateAttempt => write!(f, "attempt already exists"),
            AttemptError::QuizNotFound => write!(f, "quiz not found"),
            AttemptError::Storage(msg) => write!(f, "storage error: {}", msg),
        }
    }
}

impl std::error::Error for AttemptError {}

impl From<sqlx::Error> for AttemptError {
    fn from(err: sqlx::Error) -> Self {
        AttemptError::Storage(err.to_string())
    }
}
