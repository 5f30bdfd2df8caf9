// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    extractors::{AppPath, ValidatedJson},
    models::{
        answer::{SubmitAnswerRequest, SubmitAnswerResponse},
        quiz::{CreateQuizRequest, QuizSummary},
        user::UserIdentity,
    },
    repositories::SharedStore,
    services::{progress, quizzes, submission},
};

/// Lists quizzes visible to the caller.
pub async fn list_quizzes(
    State(store): State<SharedStore>,
    Extension(identity): Extension<UserIdentity>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = quizzes::list_quizzes(store.as_ref(), &identity).await?;
    Ok(Json(quizzes))
}

/// Creates a quiz with its questions and choices.
/// Creator only.
pub async fn create_quiz(
    State(store): State<SharedStore>,
    Extension(identity): Extension<UserIdentity>,
    ValidatedJson(payload): ValidatedJson<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = quizzes::create_quiz(store.as_ref(), &identity, &payload).await?;
    Ok((StatusCode::CREATED, Json(QuizSummary::from(&created.quiz))))
}

/// Quiz detail with questions, choices and the caller's selections.
pub async fn get_quiz(
    State(store): State<SharedStore>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(quiz_id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let detail = quizzes::quiz_detail(store.as_ref(), &identity, quiz_id).await?;
    Ok(Json(detail))
}

/// Progress of the calling participant in a quiz.
pub async fn get_progress(
    State(store): State<SharedStore>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(quiz_id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let progress = progress::progress(store.as_ref(), &identity, quiz_id).await?;
    Ok(Json(progress))
}

/// Submits the answer to one question.
///
/// * 403 unless the caller holds an activated invitation for the quiz.
/// * 404 if the quiz or question is unknown, or the question belongs elsewhere.
/// * 400 for a choice of another question or a second answer to the same question.
pub async fn submit_answer(
    State(store): State<SharedStore>,
    Extension(identity): Extension<UserIdentity>,
    AppPath((quiz_id, question_id)): AppPath<(i64, i64)>,
    ValidatedJson(payload): ValidatedJson<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let choice_id = payload
        .selected_choice
        .ok_or_else(|| AppError::BadRequest("selected_choice: This field is required.".to_string()))?;

    let answer =
        submission::submit_answer(store.as_ref(), &identity, quiz_id, question_id, choice_id)
            .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitAnswerResponse {
            message: "Answer submitted successfully.".to_string(),
            answer_id: answer.id,
        }),
    ))
}
