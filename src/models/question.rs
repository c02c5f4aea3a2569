// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::config::OPTION_COUNT;
use crate::grading::normalize::normalize;

pub const COLUMNS: &str = "\
    id, teacher_id, question_text, question_type, correct_answer, \
    option_a, option_b, option_c, option_d, points, created_at";

/// The three kinds of question a quiz can hold.
/// Stored in the `question_type` Postgres enum and sent over the wire as the same short codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "question_type")]
pub enum QuestionType {
    #[serde(rename = "MC")]
    #[sqlx(rename = "MC")]
    MultipleChoice,

    #[serde(rename = "TF")]
    #[sqlx(rename = "TF")]
    TrueFalse,

    #[serde(rename = "ID")]
    #[sqlx(rename = "ID")]
    Identification,
}

impl QuestionType {
    pub fn code(self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "MC",
            QuestionType::TrueFalse => "TF",
            QuestionType::Identification => "ID",
        }
    }
}

/// Represents the 'questions' table in the database (a teacher's question bank).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub teacher_id: i64,
    pub question_text: String,
    pub question_type: QuestionType,

    /// Meaning depends on `question_type`:
    /// an option index ("0".."3") or the option text for multiple choice,
    /// a true/false token, or free text for identification.
    pub correct_answer: String,

    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub option_c: Option<String>,
    pub option_d: Option<String>,

    /// Awarded in full for a correct answer, nothing otherwise.
    pub points: i32,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Question {
    /// The four option slots in index order (A=0 .. D=3).
    pub fn options(&self) -> [Option<&str>; OPTION_COUNT] {
        [
            self.option_a.as_deref(),
            self.option_b.as_deref(),
            self.option_c.as_deref(),
            self.option_d.as_deref(),
        ]
    }
}

/// DTO for sending a question to a student (excludes the correct answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_text: String,
    pub question_type: QuestionType,
    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub option_c: Option<String>,
    pub option_d: Option<String>,
    pub points: i32,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text.clone(),
            question_type: q.question_type,
            option_a: q.option_a.clone(),
            option_b: q.option_b.clone(),
            option_c: q.option_c.clone(),
            option_d: q.option_d.clone(),
            points: q.points,
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub question_text: String,
    pub question_type: QuestionType,
    #[validate(length(min = 1, max = 500))]
    pub correct_answer: String,
    #[validate(length(max = 200))]
    pub option_a: Option<String>,
    #[validate(length(max = 200))]
    pub option_b: Option<String>,
    #[validate(length(max = 200))]
    pub option_c: Option<String>,
    #[validate(length(max = 200))]
    pub option_d: Option<String>,
    #[validate(range(min = 1, max = 1000))]
    #[serde(default = "default_points")]
    pub points: i32,
}

fn default_points() -> i32 {
    1
}

impl CreateQuestionRequest {
    fn options(&self) -> [Option<&str>; OPTION_COUNT] {
        [
            self.option_a.as_deref(),
            self.option_b.as_deref(),
            self.option_c.as_deref(),
            self.option_d.as_deref(),
        ]
    }

    /// Type-specific checks that field-level validation cannot express.
    ///
    /// A multiple choice `correct_answer` must resolve to a filled option,
    /// either by index or by option text, or no answer could ever match it.
    pub fn check_options(&self) -> Result<(), String> {
        let options = self.options();
        let filled = options
            .iter()
            .filter(|opt| opt.is_some_and(|s| !s.trim().is_empty()))
            .count();

        match self.question_type {
            QuestionType::MultipleChoice if filled < 2 => {
                Err("Multiple choice questions need at least two options".to_string())
            }
            QuestionType::MultipleChoice => {
                let resolved = normalize(
                    Some(&self.correct_answer),
                    QuestionType::MultipleChoice,
                    &options,
                );
                let points_at_option = resolved
                    .parse::<usize>()
                    .ok()
                    .and_then(|idx| options.get(idx).copied().flatten())
                    .is_some_and(|text| !text.trim().is_empty());
                if points_at_option {
                    Ok(())
                } else {
                    Err(format!(
                        "correct_answer {:?} is neither a filled option index (0-3) nor an option's text",
                        self.correct_answer
                    ))
                }
            }
            QuestionType::TrueFalse | QuestionType::Identification if filled > 0 => Err(format!(
                "Options are only allowed on multiple choice questions (got type {})",
                self.question_type.code()
            )),
            _ => Ok(()),
        }
    }
}
