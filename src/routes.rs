// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{quiz, review, session},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (quizzes, sessions, submissions).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (session manager).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let quiz_routes = Router::new().route("/{id}", get(quiz::get_quiz));

    let session_routes = Router::new()
        .route("/api/sessions", post(session::start_session))
        .route(
            "/api/sessions/{id}",
            get(session::get_session).delete(session::discard_session),
        )
        .route("/api/sessions/{id}/answers", put(session::set_answer))
        .route("/api/sessions/{id}/submit", post(session::submit_session));

    let submission_routes = Router::new().route("/{id}/review", get(review::get_review));

    Router::new()
        .merge(session_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/submissions", submission_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
