// tests/router_tests.rs
//
// Drives the router in-process with `oneshot`, without binding a socket.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use quizhost::{
    create_router,
    repositories::{LedgerRepository, MemoryStore},
    state::AppState,
    utils::jwt::issue_token_pair,
};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

mod common;

fn router(store: Arc<MemoryStore>) -> Router {
    create_router(AppState {
        store,
        config: common::test_config(),
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn malformed_activation_body_is_bad_request() {
    let app = router(Arc::new(MemoryStore::new()));

    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/activate")
                .header("content-type", "application/json")
                .body(Body::from("{\"token\": "))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn activation_requires_patch() {
    let app = router(Arc::new(MemoryStore::new()));

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/activate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn garbage_bearer_token_is_unauthorized() {
    let app = router(Arc::new(MemoryStore::new()));

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/quizzes/1/progress")
                .header("authorization", "Bearer not.a.jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("token"));
}

#[tokio::test]
async fn consumed_token_cannot_activate_again() {
    let store = Arc::new(MemoryStore::new());
    let fx = common::seed(&store, 1).await;
    let email = format!("p_{}@example.com", &Uuid::new_v4().to_string()[..8]);
    let (_, other) = common::invite(&store, &fx.creator, fx.quiz.quiz.id, &email).await;
    let other_token = other.invitation_token.clone().unwrap();

    let activate = |token: String| {
        Request::builder()
            .method("PATCH")
            .uri("/activate")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "token": token, "password": "newpass" }).to_string(),
            ))
            .unwrap()
    };

    let first = router(store.clone())
        .oneshot(activate(other_token.clone()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = router(store.clone())
        .oneshot(activate(other_token.clone()))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);

    // The other participant's invitation is untouched
    let untouched = store.find_invitation_by_token(&fx.token).await.unwrap();
    assert!(untouched.is_some_and(|e| e.accepted_at.is_none()));
}

#[tokio::test]
async fn login_with_plain_text_body_is_unauthorized() {
    let app = router(Arc::new(MemoryStore::new()));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header("content-type", "text/plain")
                .body(Body::from("username=someone&password=secret"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid username or password.");
}

#[tokio::test]
async fn login_without_content_type_still_authenticates() {
    let store = Arc::new(MemoryStore::new());
    common::create_creator(&store, "author").await;

    let response = router(store)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .body(Body::from(
                    json!({ "username": "author", "password": common::CREATOR_PASSWORD })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn non_numeric_quiz_id_is_bad_request_with_error_body() {
    let store = Arc::new(MemoryStore::new());
    let fx = common::seed(&store, 1).await;
    let access = issue_token_pair(&fx.user, &common::test_config())
        .unwrap()
        .access;

    let response = router(store)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/quizzes/abc/progress")
                .header("authorization", format!("Bearer {}", access))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].is_string());
}
