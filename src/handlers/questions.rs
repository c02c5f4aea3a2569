// src/handlers/questions.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{self, CreateQuestionRequest, Question},
    utils::{html::clean_html, jwt::Claims, policy::require_teacher},
};

/// Lists the caller's question bank. Students have none.
pub async fn list_questions(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    if !claims.is_teacher() {
        return Ok(Json(Vec::<Question>::new()));
    }
    let teacher_id = claims.user_id()?;

    let questions = sqlx::query_as::<_, Question>(&format!(
        "SELECT {} FROM questions WHERE teacher_id = $1 ORDER BY id DESC",
        question::COLUMNS
    ))
    .bind(teacher_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list questions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(questions))
}

/// Fetches one question from the caller's bank.
pub async fn get_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = require_teacher(&claims)?;

    let question = sqlx::query_as::<_, Question>(&format!(
        "SELECT {} FROM questions WHERE id = $1 AND teacher_id = $2",
        question::COLUMNS
    ))
    .bind(id)
    .bind(teacher_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Question not found".to_string()))?;

    Ok(Json(question))
}

/// Adds a question to the calling teacher's bank.
pub async fn create_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = require_teacher(&claims)?;
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    payload.check_options().map_err(AppError::BadRequest)?;

    let question = sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions
            (teacher_id, question_text, question_type, correct_answer,
             option_a, option_b, option_c, option_d, points)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {}",
        question::COLUMNS
    ))
    .bind(teacher_id)
    .bind(clean_html(&payload.question_text))
    .bind(payload.question_type)
    .bind(&payload.correct_answer)
    .bind(&payload.option_a)
    .bind(&payload.option_b)
    .bind(&payload.option_c)
    .bind(&payload.option_d)
    .bind(payload.points)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(question_id = question.id, teacher_id, "question created");

    Ok((StatusCode::CREATED, Json(question)))
}

/// Replaces a question in the caller's bank.
///
/// Questions already used by a quiz are frozen, so stored grades keep
/// matching the question they were graded against.
pub async fn update_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = require_teacher(&claims)?;
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    payload.check_options().map_err(AppError::BadRequest)?;
    ensure_editable(&pool, id, teacher_id).await?;

    // The NOT EXISTS guard covers a quiz picking the question up in between.
    let question = sqlx::query_as::<_, Question>(&format!(
        "UPDATE questions SET
            question_text = $3, question_type = $4, correct_answer = $5,
            option_a = $6, option_b = $7, option_c = $8, option_d = $9, points = $10
         WHERE id = $1 AND teacher_id = $2
           AND NOT EXISTS (SELECT 1 FROM quiz_questions WHERE question_id = $1)
         RETURNING {}",
        question::COLUMNS
    ))
    .bind(id)
    .bind(teacher_id)
    .bind(clean_html(&payload.question_text))
    .bind(payload.question_type)
    .bind(&payload.correct_answer)
    .bind(&payload.option_a)
    .bind(&payload.option_b)
    .bind(&payload.option_c)
    .bind(&payload.option_d)
    .bind(payload.points)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(in_use)?;

    tracing::info!(question_id = id, teacher_id, "question updated");

    Ok(Json(question))
}

/// Removes a question from the caller's bank. Questions used by a quiz cannot be removed.
pub async fn delete_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = require_teacher(&claims)?;
    ensure_editable(&pool, id, teacher_id).await?;

    let deleted = sqlx::query(
        "DELETE FROM questions
         WHERE id = $1 AND teacher_id = $2
           AND NOT EXISTS (SELECT 1 FROM quiz_questions WHERE question_id = $1)",
    )
    .bind(id)
    .bind(teacher_id)
    .execute(&pool)
    .await?
    .rows_affected();

    if deleted == 0 {
        return Err(in_use());
    }

    tracing::info!(question_id = id, teacher_id, "question deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// 404 unless the caller owns the question, 409 if a quiz already uses it.
async fn ensure_editable(pool: &PgPool, id: i64, teacher_id: i64) -> Result<(), AppError> {
    let in_quiz = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM quiz_questions WHERE question_id = q.id)
         FROM questions q
         WHERE q.id = $1 AND q.teacher_id = $2",
    )
    .bind(id)
    .bind(teacher_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Question not found".to_string()))?;

    if in_quiz {
        return Err(in_use());
    }
    Ok(())
}

fn in_use() -> AppError {
    AppError::Conflict("Question is used by a quiz and can no longer change".to_string())
}
