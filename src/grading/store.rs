// src/grading/store.rs

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use sqlx::{PgPool, types::Json};

use crate::error::is_unique_violation;
use crate::grading::AttemptError;
use crate::models::{
    attempt::{Attempt, NewAttempt},
    question::{self, Question},
    quiz::Quiz,
};

const QUIZ_COLUMNS: &str = "\
    id, title, teacher_id, start_datetime, end_datetime, time_limit_minutes, show_correct_answers";

const ATTEMPT_COLUMNS: &str = "\
    id, student_id, quiz_id, score, total_questions, correct_questions, \
    total_points, max_points, attempt_datetime, results";

/// What the grading engine needs from persistence.
#[async_trait]
pub trait GradingStore: Send + Sync {
    /// Loads a quiz with its questions (in stored order) and class ids.
    async fn get_quiz(&self, quiz_id: i64) -> Result<Quiz, AttemptError>;

    async fn has_attempt(&self, student_id: i64, quiz_id: i64) -> Result<bool, AttemptError>;

    /// Persists a graded attempt. Must fail with `DuplicateAttempt` when the
    /// (student, quiz) pair already has one, atomically with the insert.
    async fn save_attempt(&self, attempt: NewAttempt) -> Result<Attempt, AttemptError>;
}

/// Postgres-backed store. Uniqueness comes from `uq_quiz_attempts_student_quiz`.
#[derive(Clone)]
pub struct PgGradingStore {
    pool: PgPool,
}

impl PgGradingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GradingStore for PgGradingStore {
    async fn get_quiz(&self, quiz_id: i64) -> Result<Quiz, AttemptError> {
        let mut quiz = sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1"
        ))
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AttemptError::QuizNotFound)?;

        quiz.questions = sqlx::query_as::<_, Question>(&format!(
            "SELECT {cols}
             FROM questions
             JOIN quiz_questions ON quiz_questions.question_id = questions.id
             WHERE quiz_questions.quiz_id = $1
             ORDER BY quiz_questions.position, questions.id",
            cols = question::COLUMNS
        ))
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        quiz.class_ids = sqlx::query_scalar::<_, i64>(
            "SELECT class_id FROM quiz_classes WHERE quiz_id = $1 ORDER BY class_id",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(quiz)
    }

    async fn has_attempt(&self, student_id: i64, quiz_id: i64) -> Result<bool, AttemptError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM quiz_attempts WHERE student_id = $1 AND quiz_id = $2)",
        )
        .bind(student_id)
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn save_attempt(&self, attempt: NewAttempt) -> Result<Attempt, AttemptError> {
        sqlx::query_as::<_, Attempt>(&format!(
            "INSERT INTO quiz_attempts
                (student_id, quiz_id, score, total_questions, correct_questions,
                 total_points, max_points, attempt_datetime, results)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {ATTEMPT_COLUMNS}"
        ))
        .bind(attempt.student_id)
        .bind(attempt.quiz_id)
        .bind(attempt.score)
        .bind(attempt.total_questions)
        .bind(attempt.correct_questions)
        .bind(attempt.total_points)
        .bind(attempt.max_points)
        .bind(attempt.attempt_datetime)
        .bind(Json(&attempt.results))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                tracing::warn!(
                    student_id = attempt.student_id,
                    quiz_id = attempt.quiz_id,
                    "concurrent duplicate attempt rejected by constraint"
                );
                AttemptError::DuplicateAttempt
            } else {
                tracing::error!("Failed to insert quiz attempt: {:?}", e);
                AttemptError::from(e)
            }
        })
    }
}

#[derive(Default)]
struct MemoryInner {
    quizzes: HashMap<i64, Quiz>,
    attempts: Vec<Attempt>,
}

/// In-process store with the same insert-if-absent guarantee as Postgres.
/// Useful for tests and for embedding the grader without a database.
#[derive(Default)]
pub struct MemoryGradingStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryGradingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_quiz(&self, quiz: Quiz) {
        self.lock().quizzes.insert(quiz.id, quiz);
    }

    /// Snapshot of every recorded attempt, in insertion order.
    pub fn attempts(&self) -> Vec<Attempt> {
        self.lock().attempts.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        // No invariant spans a panic inside the critical sections below.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl GradingStore for MemoryGradingStore {
    async fn get_quiz(&self, quiz_id: i64) -> Result<Quiz, AttemptError> {
        self.lock()
            .quizzes
            .get(&quiz_id)
            .cloned()
            .ok_or(AttemptError::QuizNotFound)
    }

    async fn has_attempt(&self, student_id: i64, quiz_id: i64) -> Result<bool, AttemptError> {
        Ok(self
            .lock()
            .attempts
            .iter()
            .any(|a| a.student_id == student_id && a.quiz_id == quiz_id))
    }

    async fn save_attempt(&self, attempt: NewAttempt) -> Result<Attempt, AttemptError> {
        let mut inner = self.lock();

        let taken = inner
            .attempts
            .iter()
            .any(|a| a.student_id == attempt.student_id && a.quiz_id == attempt.quiz_id);
        if taken {
            return Err(AttemptError::DuplicateAttempt);
        }

        let saved = attempt.into_attempt(inner.attempts.len() as i64 + 1);
        inner.attempts.push(saved.clone());
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn new_attempt(student_id: i64, quiz_id: i64) -> NewAttempt {
        NewAttempt {
            student_id,
            quiz_id,
            score: 50.0,
            total_questions: 2,
            correct_questions: 1,
            total_points: 1,
            max_points: 2,
            attempt_datetime: Utc::now(),
            results: vec![],
        }
    }

    #[tokio::test]
    async fn memory_store_enforces_one_attempt_per_pair() {
        let store = MemoryGradingStore::new();

        let first = store.save_attempt(new_attempt(1, 1)).await.unwrap();
        assert_eq!(first.id, 1);
        assert!(store.has_attempt(1, 1).await.unwrap());
        assert!(!store.has_attempt(1, 2).await.unwrap());

        let dup = store.save_attempt(new_attempt(1, 1)).await;
        assert_eq!(dup.unwrap_err(), AttemptError::DuplicateAttempt);

        let other = store.save_attempt(new_attempt(2, 1)).await.unwrap();
        assert_eq!(other.id, 2);
    }

    #[tokio::test]
    async fn memory_store_unknown_quiz() {
        let store = MemoryGradingStore::new();
        assert_eq!(
            store.get_quiz(42).await.unwrap_err(),
            AttemptError::QuizNotFound
        );
    }
}
