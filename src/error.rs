// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Failure modes of the invitation, activation, submission and progress protocols.
///
/// Each variant carries the human-readable reason that ends up in the response body.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("Participant profile not found.")]
    NoParticipantProfile,

    #[error("{0} not found.")]
    NotFound(&'static str),

    #[error("You are not allowed to answer this quiz.")]
    NotAuthorized,

    #[error("You do not own this quiz.")]
    NotQuizOwner,

    #[error("Only quiz creators may author quizzes.")]
    CreatorOnly,

    #[error("Selected choice is not valid for this question.")]
    InvalidChoice,

    #[error("You have already answered this question.")]
    AlreadyAnswered,

    #[error("Invalid or expired invitation token.")]
    InvalidToken,

    #[error("User already activated.")]
    AlreadyActive,

    #[error("Participant is already invited to this quiz.")]
    DuplicateInvitation,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotAuthenticated(String),

    #[error("Internal consistency failure: {0}")]
    Invariant(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type QuizResult<T> = Result<T, QuizError>;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Maps protocol failures onto HTTP semantics.
///
/// Conflicts (`AlreadyAnswered`, `DuplicateInvitation`) are reported as 400.
impl From<QuizError> for AppError {
    fn from(err: QuizError) -> Self {
        let reason = err.to_string();
        match err {
            QuizError::Validation(_)
            | QuizError::InvalidChoice
            | QuizError::AlreadyAnswered
            | QuizError::DuplicateInvitation
            | QuizError::InvalidToken
            | QuizError::AlreadyActive => AppError::BadRequest(reason),
            QuizError::NotAuthenticated(_) => AppError::AuthError(reason),
            QuizError::NotAuthorized
            | QuizError::NotQuizOwner
            | QuizError::CreatorOnly
            | QuizError::NoParticipantProfile => {
                AppError::Forbidden(reason)
            }
            QuizError::NotFound(_) => AppError::NotFound(reason),
            QuizError::Invariant(_) | QuizError::Database(_) => {
                AppError::InternalServerError(reason)
            }
        }
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: QuizError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn test_conflicts_map_to_bad_request() {
        assert_eq!(status_of(QuizError::AlreadyAnswered), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(QuizError::DuplicateInvitation), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(QuizError::InvalidToken), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_authorization_failures_map_to_forbidden() {
        assert_eq!(status_of(QuizError::NotAuthorized), StatusCode::FORBIDDEN);
        assert_eq!(status_of(QuizError::NoParticipantProfile), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(QuizError::NotAuthenticated("Missing token".into())),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_invariant_is_internal_error() {
        assert_eq!(status_of(QuizError::NotFound("Quiz")), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(QuizError::Invariant("ledger missing".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_reason_strings() {
        assert_eq!(QuizError::NotFound("Question").to_string(), "Question not found.");
        assert!(
            QuizError::AlreadyAnswered
                .to_string()
                .to_lowercase()
                .contains("already answered")
        );
    }
}
