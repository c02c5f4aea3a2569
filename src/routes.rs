// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{attempts, auth, classes, profile, questions, quizzes},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Public auth routes (register, login); token refresh needs a valid token.
/// * Everything else sits behind `auth_middleware`; role checks happen in handlers.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let refresh_route = Router::new()
        .route("/refresh", post(auth::refresh))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(refresh_route);

    let protected = Router::new()
        .route("/users/me", get(profile::get_me).put(profile::update_me))
        .route(
            "/classes",
            get(classes::list_classes).post(classes::create_class),
        )
        .route("/classes/join", post(classes::join_class))
        .route(
            "/classes/{id}",
            get(classes::get_class)
                .put(classes::update_class)
                .delete(classes::delete_class),
        )
        .route(
            "/questions",
            get(questions::list_questions).post(questions::create_question),
        )
        .route(
            "/questions/{id}",
            get(questions::get_question)
                .put(questions::update_question)
                .delete(questions::delete_question),
        )
        .route(
            "/quizzes",
            get(quizzes::list_quizzes).post(quizzes::create_quiz),
        )
        .route(
            "/quizzes/{id}",
            get(quizzes::get_quiz)
                .put(quizzes::update_quiz)
                .delete(quizzes::delete_quiz),
        )
        .route("/quizzes/{id}/take", post(quizzes::take_quiz))
        .route("/attempts", get(attempts::list_attempts))
        .route("/attempts/{id}", get(attempts::get_attempt))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", protected)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{body::Body, http::Request};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    /// Router over a pool that never connects; only routes that stop before the database work.
    fn app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://nobody@localhost/never")
            .unwrap();
        let config = Config {
            database_url: String::new(),
            jwt_secret: "router_test_secret".to_string(),
            jwt_expiration: 600,
            rust_log: "error".to_string(),
            server_port: 0,
            log_dir: "logs".to_string(),
        };
        create_router(AppState { pool, config })
    }

    #[tokio::test]
    async fn missing_token_is_401() {
        let response = app()
            .oneshot(Request::get("/api/quizzes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 401);
    }

    #[tokio::test]
    async fn bad_token_is_401() {
        let response = app()
            .oneshot(
                Request::post("/api/quizzes/1/take")
                    .header(header::AUTHORIZATION, "Bearer not.a.jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 401);
    }

    #[tokio::test]
    async fn teacher_cannot_take_a_quiz() {
        let token = crate::utils::jwt::sign_jwt(
            1,
            crate::utils::jwt::ROLE_TEACHER,
            "router_test_secret",
            600,
        )
        .unwrap();

        let response = app()
            .oneshot(
                Request::post("/api/quizzes/1/take")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"answers":{}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 403);
    }

    #[tokio::test]
    async fn refresh_needs_a_token() {
        let response = app()
            .oneshot(Request::post("/api/auth/refresh").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 401);
    }

    #[tokio::test]
    async fn student_cannot_delete_a_quiz() {
        let token = crate::utils::jwt::sign_jwt(
            2,
            crate::utils::jwt::ROLE_STUDENT,
            "router_test_secret",
            600,
        )
        .unwrap();

        let response = app()
            .oneshot(
                Request::delete("/api/quizzes/1")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 403);
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let response = app()
            .oneshot(Request::get("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 404);
    }
}
