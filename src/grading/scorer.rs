// src/grading/scorer.rs

use crate::grading::grader::grade;
use crate::models::{attempt::GradedResult, attempt::Submission, quiz::Quiz};

/// Aggregate outcome of grading every question in a quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSheet {
    pub total_points: i32,
    pub max_points: i32,
    pub correct_count: i32,
    pub results: Vec<GradedResult>,
}

impl ScoreSheet {
    /// Points-weighted percentage. An empty quiz scores 0.
    pub fn percentage(&self) -> f64 {
        if self.max_points > 0 {
            (self.total_points as f64 / self.max_points as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Grades every question of `quiz` in its stored order.
///
/// Answers for question ids that are not part of the quiz are ignored.
/// Correct answers are stripped from the results unless the quiz shows them.
pub fn score(quiz: &Quiz, submission: &Submission) -> ScoreSheet {
    let mut sheet = ScoreSheet {
        total_points: 0,
        max_points: 0,
        correct_count: 0,
        results: Vec::with_capacity(quiz.questions.len()),
    };

    for question in &quiz.questions {
        let mut result = grade(question, submission.answer_for(question.id));

        sheet.max_points += question.points;
        if result.correct {
            sheet.correct_count += 1;
            sheet.total_points += result.points_awarded;
        }
        if !quiz.show_correct_answers {
            result.correct_answer = None;
        }

        sheet.results.push(result);
    }

    sheet
}
