// src/models/attempt.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};

/// Outcome of grading a single question.
/// Stored verbatim inside the attempt's `results` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedResult {
    pub question_id: i64,
    pub correct: bool,

    /// Display form of what the student submitted (option text for multiple choice).
    pub user_answer: String,

    /// Display form of the correct answer; `None` unless the quiz shows correct answers.
    pub correct_answer: Option<String>,

    pub points_awarded: i32,
    pub max_points: i32,
}

/// Represents the 'quiz_attempts' table. Append-only: created once, never updated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub student_id: i64,
    pub quiz_id: i64,

    /// Points-weighted percentage in `0.0..=100.0`, unrounded.
    pub score: f64,
    pub total_questions: i32,
    pub correct_questions: i32,
    pub total_points: i32,
    pub max_points: i32,
    pub attempt_datetime: DateTime<Utc>,
    pub results: Json<Vec<GradedResult>>,
}

/// An attempt that has been graded but not yet persisted.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub student_id: i64,
    pub quiz_id: i64,
    pub score: f64,
    pub total_questions: i32,
    pub correct_questions: i32,
    pub total_points: i32,
    pub max_points: i32,
    pub attempt_datetime: DateTime<Utc>,
    pub results: Vec<GradedResult>,
}

impl NewAttempt {
    pub fn into_attempt(self, id: i64) -> Attempt {
        Attempt {
            id,
            student_id: self.student_id,
            quiz_id: self.quiz_id,
            score: self.score,
            total_questions: self.total_questions,
            correct_questions: self.correct_questions,
            total_points: self.total_points,
            max_points: self.max_points,
            attempt_datetime: self.attempt_datetime,
            results: Json(self.results),
        }
    }
}

/// A student's answers for one quiz, keyed by question id as a string.
/// Ephemeral: only the graded `Attempt` is persisted.
#[derive(Debug, Clone)]
pub struct Submission {
    pub quiz_id: i64,
    pub student_id: i64,
    pub answers: HashMap<String, String>,
}

impl Submission {
    pub fn answer_for(&self, question_id: i64) -> Option<&str> {
        self.answers.get(&question_id.to_string()).map(String::as_str)
    }
}

/// A submitted answer as it arrives in JSON.
/// Clients send option indexes as numbers and true/false as booleans as often as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawAnswer {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl RawAnswer {
    pub fn into_text(self) -> String {
        match self {
            RawAnswer::Text(s) => s,
            RawAnswer::Number(n) => n.to_string(),
            RawAnswer::Flag(b) => b.to_string(),
        }
    }
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct TakeQuizRequest {
    /// Key: question id. Value: the student's answer, or null when skipped.
    #[serde(default)]
    pub answers: HashMap<String, Option<RawAnswer>>,
}

impl TakeQuizRequest {
    pub fn into_submission(self, quiz_id: i64, student_id: i64) -> Submission {
        let answers = self
            .answers
            .into_iter()
            .filter_map(|(id, ans)| ans.map(|a| (id, a.into_text())))
            .collect();

        Submission {
            quiz_id,
            student_id,
            answers,
        }
    }
}

/// Response body of the take-quiz endpoint.
#[derive(Debug, Serialize)]
pub struct TakeQuizResponse {
    pub attempt_id: i64,
    pub score: f64,
    pub correct_questions: i32,
    pub total_questions: i32,
    pub total_points: i32,
    pub max_points: i32,
    pub results: Vec<GradedResult>,
}

impl From<Attempt> for TakeQuizResponse {
    fn from(attempt: Attempt) -> Self {
        Self {
            attempt_id: attempt.id,
            score: attempt.score,
            correct_questions: attempt.correct_questions,
            total_questions: attempt.total_questions,
            total_points: attempt.total_points,
            max_points: attempt.max_points,
            results: attempt.results.0,
        }
    }
}

/// Attempt row joined with the student and quiz names, used for listings.
#[derive(Debug, Serialize, FromRow)]
pub struct AttemptSummary {
    pub id: i64,
    pub student_id: i64,
    pub student_username: String,
    pub quiz_id: i64,
    pub quiz_title: String,
    pub score: f64,
    pub total_questions: i32,
    pub correct_questions: i32,
    pub total_points: i32,
    pub max_points: i32,
    pub attempt_datetime: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_accept_strings_numbers_booleans_and_null() {
        let req: TakeQuizRequest = serde_json::from_value(serde_json::json!({
            "answers": {"1": "Paris", "2": 0, "3": true, "4": null}
        }))
        .unwrap();

        let submission = req.into_submission(5, 6);
        assert_eq!(submission.answer_for(1), Some("Paris"));
        assert_eq!(submission.answer_for(2), Some("0"));
        assert_eq!(submission.answer_for(3), Some("true"));
        assert_eq!(submission.answer_for(4), None);
        assert_eq!(submission.answers.len(), 3);
    }

    #[test]
    fn missing_answers_field_is_an_empty_submission() {
        let req: TakeQuizRequest = serde_json::from_str("{}").unwrap();
        assert!(req.into_submission(1, 1).answers.is_empty());
    }
}
