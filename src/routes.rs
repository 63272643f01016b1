// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{attempt, question, quiz},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Every `/api` route sits behind the bearer-token middleware.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store and config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes).post(quiz::create_quiz))
        .route("/{id}", get(quiz::get_quiz))
        .route("/{id}/questions", post(quiz::add_question))
        .route("/{id}/start-attempt", post(quiz::start_attempt))
        .route("/{id}/submit-attempt", post(quiz::submit_attempt))
        .route("/{id}/attempt", get(quiz::get_my_attempt))
        .route("/{id}/attempts", get(quiz::list_quiz_attempts));

    let question_routes = Router::new()
        .route("/{id}/options", post(question::add_option))
        .route("/{id}/correct-option", put(question::set_correct_option));

    let attempt_routes = Router::new()
        .route("/", get(attempt::list_my_attempts))
        .route("/{id}", get(attempt::get_attempt));

    let api_routes = Router::new()
        .nest("/quizzes", quiz_routes)
        .nest("/questions", question_routes)
        .nest("/attempts", attempt_routes)
        .route("/answers", post(attempt::record_answer))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api", api_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
