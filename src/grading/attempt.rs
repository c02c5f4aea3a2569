// src/grading/attempt.rs

use chrono::{DateTime, Utc};

use crate::grading::{AttemptError, GradingStore, scorer::score};
use crate::models::{
    attempt::{Attempt, NewAttempt, Submission},
    quiz::Quiz,
};

/// Grades a submission and records it as the student's one attempt at `quiz`.
///
/// Checks run in order and the first failure wins:
/// 1. the quiz must be active at `now` (`QuizNotActive`),
/// 2. the student must not have an attempt yet (`DuplicateAttempt`).
///
/// The existence check is a fast path only. The store's insert is the real
/// uniqueness boundary, so a concurrent second writer also gets `DuplicateAttempt`.
pub async fn submit_attempt<S>(
    store: &S,
    quiz: &Quiz,
    submission: &Submission,
    now: DateTime<Utc>,
) -> Result<Attempt, AttemptError>
where
    S: GradingStore + ?Sized,
{
    if submission.quiz_id != quiz.id {
        return Err(AttemptError::QuizNotFound);
    }

    if !quiz.is_active(now) {
        tracing::debug!(quiz_id = quiz.id, %now, "submission outside quiz window");
        return Err(AttemptError::QuizNotActive);
    }

    if store.has_attempt(submission.student_id, quiz.id).await? {
        return Err(AttemptError::DuplicateAttempt);
    }

    let sheet = score(quiz, submission);
    let percentage = sheet.percentage();

    let attempt = store
        .save_attempt(NewAttempt {
            student_id: submission.student_id,
            quiz_id: quiz.id,
            score: percentage,
            total_questions: quiz.questions.len() as i32,
            correct_questions: sheet.correct_count,
            total_points: sheet.total_points,
            max_points: sheet.max_points,
            attempt_datetime: now,
            results: sheet.results,
        })
        .await?;

    tracing::info!(
        attempt_id = attempt.id,
        student_id = attempt.student_id,
        quiz_id = attempt.quiz_id,
        score = attempt.score,
        "quiz attempt recorded"
    );

    Ok(attempt)
}
