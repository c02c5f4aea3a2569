// src/handlers/classes.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    models::class::{
        Class, ClassDetail, ClassStudent, ClassSummary, CreateClassRequest, JoinClassRequest,
        UpdateClassRequest,
    },
    utils::{
        html::clean_html,
        join_code::{generate_join_code, normalize_join_code},
        jwt::Claims,
        policy::{is_enrolled, require_teacher},
    },
};

const CLASS_COLUMNS: &str = "id, name, section, teacher_id, join_code, created_at";

// Retries on join code collision.
const JOIN_CODE_ATTEMPTS: usize = 5;

const SUMMARY_SELECT: &str = r#"
    SELECT
        c.id, c.name, c.section, c.teacher_id,
        u.username AS teacher_username,
        c.join_code,
        (SELECT COUNT(*) FROM class_students cs WHERE cs.class_id = c.id) AS student_count
    FROM classes c
    JOIN users u ON u.id = c.teacher_id
"#;

/// Lists classes visible to the caller.
///
/// Teachers see the classes they created; students see the ones they joined.
pub async fn list_classes(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let filter = if claims.is_teacher() {
        "WHERE c.teacher_id = $1"
    } else {
        "WHERE EXISTS (SELECT 1 FROM class_students cs WHERE cs.class_id = c.id AND cs.student_id = $1)"
    };

    let classes = sqlx::query_as::<_, ClassSummary>(&format!(
        "{SUMMARY_SELECT} {filter} ORDER BY c.id DESC"
    ))
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list classes: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(classes))
}

/// Creates a class owned by the calling teacher, with a fresh join code.
pub async fn create_class(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateClassRequest>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = require_teacher(&claims)?;
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let name = clean_html(payload.name.trim());
    let section = clean_html(payload.section.as_deref().unwrap_or_default().trim());

    for _ in 0..JOIN_CODE_ATTEMPTS {
        let code = generate_join_code();
        let inserted = sqlx::query_as::<_, Class>(&format!(
            "INSERT INTO classes (name, section, teacher_id, join_code)
             VALUES ($1, $2, $3, $4)
             RETURNING {CLASS_COLUMNS}"
        ))
        .bind(&name)
        .bind(&section)
        .bind(teacher_id)
        .bind(&code)
        .fetch_one(&pool)
        .await;

        match inserted {
            Ok(class) => {
                tracing::info!(class_id = class.id, teacher_id, "class created");
                return Ok((StatusCode::CREATED, Json(class)));
            }
            Err(e) if is_unique_violation(&e) => {
                tracing::warn!("Join code collision on {}, retrying", code);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::InternalServerError(
        "Could not allocate a unique join code".to_string(),
    ))
}

/// Enrolls the calling student in the class with the given join code.
pub async fn join_class(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<JoinClassRequest>,
) -> Result<impl IntoResponse, AppError> {
    if claims.is_teacher() {
        return Err(AppError::Forbidden("Teachers cannot join classes".to_string()));
    }
    let student_id = claims.user_id()?;
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let class = sqlx::query_as::<_, Class>(&format!(
        "SELECT {CLASS_COLUMNS} FROM classes WHERE join_code = $1"
    ))
    .bind(normalize_join_code(&payload.join_code))
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Invalid join code".to_string()))?;

    if is_enrolled(&pool, student_id, class.id).await? {
        return Err(AppError::BadRequest(
            "Already a member of this class".to_string(),
        ));
    }

    // A concurrent join for the same pair is absorbed by the primary key.
    sqlx::query(
        "INSERT INTO class_students (class_id, student_id) VALUES ($1, $2)
         ON CONFLICT DO NOTHING",
    )
    .bind(class.id)
    .bind(student_id)
    .execute(&pool)
    .await?;

    tracing::info!(class_id = class.id, student_id, "student joined class");

    Ok(Json(json!({
        "message": "Successfully joined class",
        "class_id": class.id,
        "class_name": class.display_name(),
    })))
}

/// Fetches a class with its student roster.
///
/// Visible to the owning teacher and to enrolled students; anyone else gets 404.
pub async fn get_class(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let class = sqlx::query_as::<_, Class>(&format!(
        "SELECT {CLASS_COLUMNS} FROM classes WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(class_not_found)?;

    let visible = if claims.is_teacher() {
        class.teacher_id == user_id
    } else {
        is_enrolled(&pool, user_id, class.id).await?
    };
    if !visible {
        return Err(class_not_found());
    }

    let students = sqlx::query_as::<_, ClassStudent>(
        "SELECT u.id, u.username, u.first_name, u.last_name, cs.joined_at
         FROM class_students cs
         JOIN users u ON u.id = cs.student_id
         WHERE cs.class_id = $1
         ORDER BY u.username",
    )
    .bind(class.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(ClassDetail::new(class, students)))
}

/// Renames a class. Owner only; the join code never changes.
pub async fn update_class(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateClassRequest>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = require_teacher(&claims)?;
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let class = sqlx::query_as::<_, Class>(&format!(
        "UPDATE classes SET
            name = COALESCE($3, name),
            section = COALESCE($4, section)
         WHERE id = $1 AND teacher_id = $2
         RETURNING {CLASS_COLUMNS}"
    ))
    .bind(id)
    .bind(teacher_id)
    .bind(payload.name.as_deref().map(|n| clean_html(n.trim())))
    .bind(payload.section.as_deref().map(|s| clean_html(s.trim())))
    .fetch_optional(&pool)
    .await?
    .ok_or_else(class_not_found)?;

    tracing::info!(class_id = class.id, teacher_id, "class updated");

    Ok(Json(class))
}

/// Deletes a class. Owner only. Enrollments and quiz assignments go with it.
pub async fn delete_class(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = require_teacher(&claims)?;

    let deleted = sqlx::query("DELETE FROM classes WHERE id = $1 AND teacher_id = $2")
        .bind(id)
        .bind(teacher_id)
        .execute(&pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(class_not_found());
    }

    tracing::info!(class_id = id, teacher_id, "class deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn class_not_found() -> AppError {
    AppError::NotFound("Class not found".to_string())
}
