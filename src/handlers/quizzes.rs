// src/handlers/quizzes.rs

use std::collections::HashSet;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use validator::Validate;

use crate::{
    error::AppError,
    grading::{AttemptError, GradingStore, PgGradingStore, submit_attempt},
    models::{
        attempt::{TakeQuizRequest, TakeQuizResponse},
        quiz::{CreateQuizRequest, PublicQuiz, QuizSummary},
    },
    utils::{
        html::clean_html,
        jwt::Claims,
        policy::{is_enrolled_in_quiz, is_owner, require_student, require_teacher},
    },
};

const SUMMARY_SELECT: &str = r#"
    SELECT
        q.id, q.title, q.teacher_id, q.start_datetime, q.end_datetime,
        q.time_limit_minutes, q.show_correct_answers,
        (SELECT COUNT(*) FROM quiz_questions qq WHERE qq.quiz_id = q.id) AS question_count
    FROM quizzes q
"#;

/// Lists quizzes visible to the caller.
///
/// Teachers see quizzes they own; students see quizzes assigned to any class they joined.
pub async fn list_quizzes(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let filter = if claims.is_teacher() {
        "WHERE q.teacher_id = $1"
    } else {
        "WHERE EXISTS (
            SELECT 1 FROM quiz_classes qc
            JOIN class_students cs ON cs.class_id = qc.class_id
            WHERE qc.quiz_id = q.id AND cs.student_id = $1
        )"
    };

    let quizzes = sqlx::query_as::<_, QuizSummary>(&format!(
        "{SUMMARY_SELECT} {filter} ORDER BY q.start_datetime DESC, q.id DESC"
    ))
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list quizzes: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(quizzes))
}

/// Creates a quiz from questions and classes the teacher owns.
///
/// `question_ids` order becomes the stored question order.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    State(store): State<PgGradingStore>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = require_teacher(&claims)?;
    check_quiz_request(&pool, teacher_id, &payload).await?;

    let mut tx = pool.begin().await?;

    let quiz_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO quizzes
            (title, teacher_id, start_datetime, end_datetime, time_limit_minutes, show_correct_answers)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id",
    )
    .bind(clean_html(payload.title.trim()))
    .bind(teacher_id)
    .bind(payload.start_datetime)
    .bind(payload.end_datetime)
    .bind(payload.time_limit_minutes)
    .bind(payload.show_correct_answers)
    .fetch_one(&mut *tx)
    .await?;

    write_links(&mut tx, quiz_id, &payload).await?;

    tx.commit().await?;

    tracing::info!(
        quiz_id,
        teacher_id,
        questions = payload.question_ids.len(),
        "quiz created"
    );

    let quiz = store.get_quiz(quiz_id).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Replaces a quiz's settings, questions and classes. Owner only.
///
/// Once a quiz has attempts its question list is frozen; other fields stay editable.
pub async fn update_quiz(
    State(pool): State<PgPool>,
    State(store): State<PgGradingStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = require_teacher(&claims)?;
    let current = store.get_quiz(id).await?;
    if !is_owner(teacher_id, &current) {
        return Err(AttemptError::QuizNotFound.into());
    }
    check_quiz_request(&pool, teacher_id, &payload).await?;

    let mut tx = pool.begin().await?;

    // Row lock serializes this edit against other edits of the same quiz.
    sqlx::query("SELECT id FROM quizzes WHERE id = $1 FOR UPDATE")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let current_ids: Vec<i64> = current.questions.iter().map(|q| q.id).collect();
    if current_ids != payload.question_ids {
        let attempted = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM quiz_attempts WHERE quiz_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if attempted {
            return Err(AppError::Conflict(
                "Quiz already has attempts; its questions can no longer change".to_string(),
            ));
        }
    }

    sqlx::query(
        "UPDATE quizzes SET
            title = $2, start_datetime = $3, end_datetime = $4,
            time_limit_minutes = $5, show_correct_answers = $6
         WHERE id = $1",
    )
    .bind(id)
    .bind(clean_html(payload.title.trim()))
    .bind(payload.start_datetime)
    .bind(payload.end_datetime)
    .bind(payload.time_limit_minutes)
    .bind(payload.show_correct_answers)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM quiz_questions WHERE quiz_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM quiz_classes WHERE quiz_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    write_links(&mut tx, id, &payload).await?;

    tx.commit().await?;

    tracing::info!(quiz_id = id, teacher_id, "quiz updated");

    let quiz = store.get_quiz(id).await?;
    Ok(Json(quiz))
}

/// Deletes a quiz and, with it, every attempt on it. Owner only.
pub async fn delete_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = require_teacher(&claims)?;

    let deleted = sqlx::query("DELETE FROM quizzes WHERE id = $1 AND teacher_id = $2")
        .bind(id)
        .bind(teacher_id)
        .execute(&pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AttemptError::QuizNotFound.into());
    }

    tracing::info!(quiz_id = id, teacher_id, "quiz deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Fetches a quiz.
///
/// The owner gets everything, including correct answers. An enrolled student
/// gets the questions without answers. Anyone else gets 404.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    State(store): State<PgGradingStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let user_id = claims.user_id()?;
    let quiz = store.get_quiz(id).await?;

    if claims.is_teacher() {
        if !is_owner(user_id, &quiz) {
            return Err(AttemptError::QuizNotFound.into());
        }
        return Ok(Json(quiz).into_response());
    }

    if !is_enrolled_in_quiz(&pool, user_id, &quiz).await? {
        return Err(AttemptError::QuizNotFound.into());
    }
    Ok(Json(PublicQuiz::from_quiz(&quiz, Utc::now())).into_response())
}

/// Grades and records the calling student's one attempt at a quiz.
pub async fn take_quiz(
    State(pool): State<PgPool>,
    State(store): State<PgGradingStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<TakeQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = require_student(&claims)?;

    let quiz = store.get_quiz(id).await?;
    if !is_enrolled_in_quiz(&pool, student_id, &quiz).await? {
        return Err(AttemptError::QuizNotFound.into());
    }

    let submission = payload.into_submission(quiz.id, student_id);
    let attempt = submit_attempt(&store, &quiz, &submission, Utc::now()).await?;

    Ok(Json(TakeQuizResponse::from(attempt)))
}

/// Field, window, uniqueness and ownership checks shared by create and update.
async fn check_quiz_request(
    pool: &PgPool,
    teacher_id: i64,
    payload: &CreateQuizRequest,
) -> Result<(), AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    payload.check_window().map_err(AppError::BadRequest)?;
    ensure_unique(&payload.question_ids, "question_ids")?;
    ensure_unique(&payload.class_ids, "class_ids")?;

    let owned_questions = count_owned(pool, "questions", teacher_id, &payload.question_ids).await?;
    if owned_questions != payload.question_ids.len() as i64 {
        return Err(AppError::BadRequest(
            "Every question must exist in your question bank".to_string(),
        ));
    }
    let owned_classes = count_owned(pool, "classes", teacher_id, &payload.class_ids).await?;
    if owned_classes != payload.class_ids.len() as i64 {
        return Err(AppError::BadRequest(
            "Every class must be one you teach".to_string(),
        ));
    }
    Ok(())
}

/// Inserts the ordered question links and the class assignments of a quiz.
async fn write_links(
    tx: &mut Transaction<'_, Postgres>,
    quiz_id: i64,
    payload: &CreateQuizRequest,
) -> Result<(), sqlx::Error> {
    for (position, question_id) in payload.question_ids.iter().enumerate() {
        sqlx::query("INSERT INTO quiz_questions (quiz_id, question_id, position) VALUES ($1, $2, $3)")
            .bind(quiz_id)
            .bind(question_id)
            .bind(position as i32)
            .execute(&mut **tx)
            .await?;
    }

    if !payload.class_ids.is_empty() {
        sqlx::query(
            "INSERT INTO quiz_classes (quiz_id, class_id)
             SELECT $1, UNNEST($2::BIGINT[])",
        )
        .bind(quiz_id)
        .bind(&payload.class_ids)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

fn ensure_unique(ids: &[i64], field: &str) -> Result<(), AppError> {
    let mut seen = HashSet::with_capacity(ids.len());
    if ids.iter().all(|id| seen.insert(*id)) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("{} contains duplicates", field)))
    }
}

/// Counts how many of `ids` exist in `table` with `teacher_id` = the caller.
/// `table` is always a literal from this module.
async fn count_owned(
    pool: &PgPool,
    table: &'static str,
    teacher_id: i64,
    ids: &[i64],
) -> Result<i64, AppError> {
    if ids.is_empty() {
        return Ok(0);
    }

    let count = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM {table} WHERE teacher_id = $1 AND id = ANY($2)"
    ))
    .bind(teacher_id)
    .bind(ids)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
