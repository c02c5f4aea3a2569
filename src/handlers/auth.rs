// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::user::{CreateUserRequest, LoginRequest, User},
    utils::{
        hash::{hash_password, verify_password},
        jwt::{Claims, sign_jwt},
    },
};

pub(crate) const USER_COLUMNS: &str =
    "id, username, email, password, first_name, last_name, is_teacher, created_at";

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Without an email (or with a blank one), `<username>@example.com` is used.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.without_blank_email();
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;
    let email = payload
        .email
        .clone()
        .unwrap_or_else(|| format!("{}@example.com", payload.username));

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (username, email, password, first_name, last_name, is_teacher)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&payload.username)
    .bind(&email)
    .bind(&hashed_password)
    .bind(payload.first_name.as_deref().unwrap_or_default())
    .bind(payload.last_name.as_deref().unwrap_or_default())
    .bind(payload.is_teacher)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!(
                "Username '{}' or email '{}' already exists",
                payload.username, email
            ))
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!(user_id = user.id, role = user.role(), "user registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
///
/// Verifies the username and password against the database.
/// If valid, signs a JWT token with the user's ID and role.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
    ))
    .bind(&payload.username)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let user = user.ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    token_response(&user, &config)
}

/// Exchanges a still-valid token for a fresh one.
///
/// The user is reloaded, so a deleted account cannot refresh and the role
/// always reflects the stored user.
pub async fn refresh(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::AuthError("User no longer exists".to_string()))?;

    token_response(&user, &config)
}

fn token_response(user: &User, config: &Config) -> Result<Json<serde_json::Value>, AppError> {
    let token = sign_jwt(
        user.id,
        user.role(),
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "is_teacher": user.is_teacher
    })))
}
