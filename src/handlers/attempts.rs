// src/handlers/attempts.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::attempt::{Attempt, AttemptSummary},
    utils::jwt::Claims,
};

const SUMMARY_SELECT: &str = r#"
    SELECT
        a.id, a.student_id, u.username AS student_username,
        a.quiz_id, q.title AS quiz_title,
        a.score, a.total_questions, a.correct_questions,
        a.total_points, a.max_points, a.attempt_datetime
    FROM quiz_attempts a
    JOIN users u ON u.id = a.student_id
    JOIN quizzes q ON q.id = a.quiz_id
"#;

/// Teachers see attempts on quizzes they own; students see their own.
fn visibility_filter(claims: &Claims) -> &'static str {
    if claims.is_teacher() {
        "q.teacher_id = $1"
    } else {
        "a.student_id = $1"
    }
}

/// Lists attempts visible to the caller, newest first.
pub async fn list_attempts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let attempts = sqlx::query_as::<_, AttemptSummary>(&format!(
        "{SUMMARY_SELECT} WHERE {} ORDER BY a.attempt_datetime DESC, a.id DESC",
        visibility_filter(&claims)
    ))
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list attempts: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(attempts))
}

/// Fetches one attempt with its stored per-question results.
pub async fn get_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let attempt = sqlx::query_as::<_, Attempt>(&format!(
        "SELECT a.id, a.student_id, a.quiz_id, a.score, a.total_questions,
                a.correct_questions, a.total_points, a.max_points,
                a.attempt_datetime, a.results
         FROM quiz_attempts a
         JOIN quizzes q ON q.id = a.quiz_id
         WHERE a.id = $2 AND {}",
        visibility_filter(&claims)
    ))
    .bind(user_id)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Attempt not found".to_string()))?;

    Ok(Json(attempt))
}
