// src/grading/grader.rs

use crate::grading::normalize::{display_form, normalize};
use crate::models::{attempt::GradedResult, question::Question};

/// Grades one answer against one question.
///
/// Both sides are normalized before an exact comparison. A missing or
/// unrecognized answer is simply wrong; grading never fails.
/// The correct answer is always filled in here; hiding it is the scorer's job.
pub fn grade(question: &Question, submitted: Option<&str>) -> GradedResult {
    let options = question.options();

    let submitted = normalize(submitted, question.question_type, &options);
    let correct = normalize(
        Some(question.correct_answer.as_str()),
        question.question_type,
        &options,
    );

    let is_correct = submitted == correct;
    let points_awarded = if is_correct { question.points } else { 0 };

    tracing::debug!(
        question_id = question.id,
        correct = is_correct,
        points_awarded,
        "graded question"
    );

    GradedResult {
        question_id: question.id,
        correct: is_correct,
        user_answer: display_form(&submitted, question.question_type, &options),
        correct_answer: Some(display_form(&correct, question.question_type, &options)),
        points_awarded,
        max_points: question.points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionType;

    fn question(question_type: QuestionType, correct: &str, options: [Option<&str>; 4]) -> Question {
        Question {
            id: 11,
            teacher_id: 1,
            question_text: "?".to_string(),
            question_type,
            correct_answer: correct.to_string(),
            option_a: options[0].map(str::to_string),
            option_b: options[1].map(str::to_string),
            option_c: options[2].map(str::to_string),
            option_d: options[3].map(str::to_string),
            points: 3,
            created_at: None,
        }
    }

    fn capital_question() -> Question {
        question(
            QuestionType::MultipleChoice,
            "0",
            [Some("Paris"), Some("Lyon"), Some("Nice"), Some("Lille")],
        )
    }

    #[test]
    fn option_text_and_index_are_equivalent() {
        let q = capital_question();
        let by_text = grade(&q, Some("Paris"));
        let by_index = grade(&q, Some("0"));

        assert!(by_text.correct);
        assert!(by_index.correct);
        assert_eq!(by_text, by_index);
        assert_eq!(by_text.user_answer, "Paris");
        assert_eq!(by_text.correct_answer.as_deref(), Some("Paris"));
        assert_eq!(by_text.points_awarded, 3);
    }

    #[test]
    fn stored_answer_as_option_text_is_normalized_too() {
        let mut q = capital_question();
        q.correct_answer = "Lyon".to_string();
        assert!(grade(&q, Some("1")).correct);
        assert!(grade(&q, Some(" Lyon ")).correct);
        assert!(!grade(&q, Some("0")).correct);
    }

    #[test]
    fn wrong_choice_scores_nothing() {
        let r = grade(&capital_question(), Some("2"));
        assert!(!r.correct);
        assert_eq!(r.points_awarded, 0);
        assert_eq!(r.max_points, 3);
        assert_eq!(r.user_answer, "Nice");
    }

    #[test]
    fn missing_answer_is_incorrect_not_an_error() {
        let r = grade(&capital_question(), None);
        assert!(!r.correct);
        assert_eq!(r.user_answer, "");
        assert_eq!(r.points_awarded, 0);
    }

    #[test]
    fn true_false_tokens_compare_canonically() {
        let q = question(QuestionType::TrueFalse, "True", [None; 4]);
        assert!(grade(&q, Some("t")).correct);
        assert!(grade(&q, Some("YES")).correct);
        assert!(!grade(&q, Some("no")).correct);

        let f = question(QuestionType::TrueFalse, "false", [None; 4]);
        assert!(grade(&f, Some("no")).correct);
        assert_eq!(grade(&f, Some("no")).user_answer, "false");
    }

    #[test]
    fn unrecognized_true_false_tokens_compare_lowercased() {
        let q = question(QuestionType::TrueFalse, "maybe", [None; 4]);
        // The stored answer is not a recognized token either, but both pass
        // through lowercased and still compare equal.
        assert!(grade(&q, Some("Maybe")).correct);

        let t = question(QuestionType::TrueFalse, "true", [None; 4]);
        assert!(!grade(&t, Some("perhaps")).correct);
    }

    #[test]
    fn identification_trims_and_folds_case() {
        let q = question(QuestionType::Identification, "Manila", [None; 4]);
        let r = grade(&q, Some("  manila "));
        assert!(r.correct);
        assert_eq!(r.user_answer, "manila");
        assert_eq!(r.correct_answer.as_deref(), Some("manila"));
        assert!(!grade(&q, Some("Cebu")).correct);
    }

    #[test]
    fn grading_is_idempotent() {
        let q = capital_question();
        for answer in [Some("Paris"), Some("3"), Some("nonsense"), None] {
            assert_eq!(grade(&q, answer), grade(&q, answer));
        }
    }
}
