// src/utils/policy.rs

//! Authorization predicates, applied at the handler boundary only.

use sqlx::PgPool;

use crate::{error::AppError, models::quiz::Quiz, utils::jwt::Claims};

/// Returns the caller's id if they are a teacher, 403 otherwise.
pub fn require_teacher(claims: &Claims) -> Result<i64, AppError> {
    let user_id = claims.user_id()?;
    if !claims.is_teacher() {
        return Err(AppError::Forbidden("Only teachers can do this".to_string()));
    }
    Ok(user_id)
}

/// Returns the caller's id if they are a student, 403 otherwise.
pub fn require_student(claims: &Claims) -> Result<i64, AppError> {
    let user_id = claims.user_id()?;
    if claims.is_teacher() {
        return Err(AppError::Forbidden("Only students can do this".to_string()));
    }
    Ok(user_id)
}

pub fn is_owner(user_id: i64, quiz: &Quiz) -> bool {
    quiz.teacher_id == user_id
}

pub async fn is_enrolled(pool: &PgPool, student_id: i64, class_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM class_students WHERE class_id = $1 AND student_id = $2)",
    )
    .bind(class_id)
    .bind(student_id)
    .fetch_one(pool)
    .await
}

/// A student can see a quiz when enrolled in at least one class it is assigned to.
pub async fn is_enrolled_in_quiz(
    pool: &PgPool,
    student_id: i64,
    quiz: &Quiz,
) -> Result<bool, sqlx::Error> {
    if quiz.class_ids.is_empty() {
        return Ok(false);
    }

    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(
            SELECT 1 FROM class_students
            WHERE student_id = $1 AND class_id = ANY($2)
        )",
    )
    .bind(student_id)
    .bind(&quiz.class_ids)
    .fetch_one(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::jwt::{ROLE_STUDENT, ROLE_TEACHER};
    use chrono::Utc;

    fn claims(id: i64, role: &str) -> Claims {
        Claims {
            sub: id.to_string(),
            role: role.to_string(),
            exp: 0,
        }
    }

    #[test]
    fn role_gates() {
        assert_eq!(require_teacher(&claims(3, ROLE_TEACHER)).unwrap(), 3);
        assert!(matches!(
            require_teacher(&claims(3, ROLE_STUDENT)),
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(require_student(&claims(4, ROLE_STUDENT)).unwrap(), 4);
        assert!(matches!(
            require_student(&claims(4, ROLE_TEACHER)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn ownership() {
        let now = Utc::now();
        let quiz = Quiz {
            id: 1,
            title: "t".to_string(),
            teacher_id: 9,
            start_datetime: now,
            end_datetime: now,
            time_limit_minutes: 30,
            show_correct_answers: false,
            questions: vec![],
            class_ids: vec![],
        };
        assert!(is_owner(9, &quiz));
        assert!(!is_owner(10, &quiz));
    }
}
