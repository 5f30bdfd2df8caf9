// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, invitation, quiz},
    state::AppState,
    utils::jwt::{auth_middleware, creator_middleware},
};

/// Assembles the main application router.
///
/// * Public auth routes (activate, login, refresh).
/// * Authenticated quiz routes; creator-only routes additionally pass the creator guard.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/activate", patch(auth::activate))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh));

    let creator_routes = Router::new()
        .route("/quizzes", post(quiz::create_quiz))
        .route("/quizzes/{id}/invitations", post(invitation::create_invitation))
        .route_layer(middleware::from_fn(creator_middleware));

    // Auth first, then the creator check on the routes above
    let protected_routes = Router::new()
        .route("/quizzes", get(quiz::list_quizzes))
        .route("/quizzes/{id}", get(quiz::get_quiz))
        .route("/quizzes/{id}/progress", get(quiz::get_progress))
        .route(
            "/quizzes/{id}/questions/{question_id}/answers",
            post(quiz::submit_answer),
        )
        .route(
            "/quizzes/{id}/questions/{question_id}/answers/",
            post(quiz::submit_answer),
        )
        .route("/invitations/accept", post(invitation::accept_invitation))
        .merge(creator_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(auth_routes)
        .merge(protected_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
