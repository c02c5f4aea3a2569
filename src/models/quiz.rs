// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::question::{PublicQuestion, Question};

/// Represents the 'quizzes' table, with its questions and classes resolved.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub teacher_id: i64,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub time_limit_minutes: i32,
    pub show_correct_answers: bool,

    /// Questions in their stored order. Loaded from `quiz_questions`.
    #[sqlx(skip)]
    #[serde(default)]
    pub questions: Vec<Question>,

    /// Classes the quiz is assigned to. Loaded from `quiz_classes`.
    #[sqlx(skip)]
    #[serde(default)]
    pub class_ids: Vec<i64>,
}

impl Quiz {
    /// A quiz accepts submissions from `start_datetime` through `end_datetime`, both inclusive.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.start_datetime <= now && now <= self.end_datetime
    }
}

/// What a student sees of a quiz: no correct answers.
#[derive(Debug, Serialize)]
pub struct PublicQuiz {
    pub id: i64,
    pub title: String,
    pub teacher_id: i64,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub time_limit_minutes: i32,
    pub show_correct_answers: bool,
    pub is_active: bool,
    pub questions: Vec<PublicQuestion>,
}

impl PublicQuiz {
    pub fn from_quiz(quiz: &Quiz, now: DateTime<Utc>) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title.clone(),
            teacher_id: quiz.teacher_id,
            start_datetime: quiz.start_datetime,
            end_datetime: quiz.end_datetime,
            time_limit_minutes: quiz.time_limit_minutes,
            show_correct_answers: quiz.show_correct_answers,
            is_active: quiz.is_active(now),
            questions: quiz.questions.iter().map(PublicQuestion::from).collect(),
        }
    }
}

/// Quiz row without questions, used for listings.
#[derive(Debug, Serialize, FromRow)]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    pub teacher_id: i64,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub time_limit_minutes: i32,
    pub show_correct_answers: bool,
    pub question_count: i64,
}

/// DTO for creating a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    #[validate(range(min = 1, max = 1440))]
    #[serde(default = "default_time_limit")]
    pub time_limit_minutes: i32,
    #[serde(default)]
    pub show_correct_answers: bool,
    /// Question ids in the order they should be presented and graded.
    #[validate(length(max = 200))]
    #[serde(default)]
    pub question_ids: Vec<i64>,
    #[serde(default)]
    pub class_ids: Vec<i64>,
}

fn default_time_limit() -> i32 {
    30
}

impl CreateQuizRequest {
    pub fn check_window(&self) -> Result<(), String> {
        if self.end_datetime <= self.start_datetime {
            return Err("end_datetime must be after start_datetime".to_string());
        }
        Ok(())
    }
}
