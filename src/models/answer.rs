// src/models/answer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::invitation::QuizParticipant;

/// Journal entry: a participant's selected choice for one question.
/// Represents the 'participant_answers' table, unique per (participant_id, question_id).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ParticipantAnswer {
    pub id: i64,
    pub participant_id: i64,
    pub quiz_id: i64,
    pub question_id: i64,
    pub selected_choice_id: i64,
    pub answered_at: DateTime<Utc>,
}

/// Input for recording an answer. All references are validated before it is built.
#[derive(Debug, Clone, Copy)]
pub struct NewAnswer {
    /// Ledger entry the answer counts towards.
    pub entry_id: i64,
    pub participant_id: i64,
    pub quiz_id: i64,
    pub question_id: i64,
    pub selected_choice_id: i64,
}

/// Result of the atomic submit unit: the journal entry and the ledger as left behind.
#[derive(Debug, Clone)]
pub struct RecordedAnswer {
    pub answer: ParticipantAnswer,
    pub entry: QuizParticipant,
}

/// DTO for `POST /quizzes/{quiz_id}/questions/{question_id}/answers/`.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(required(message = "selected_choice: This field is required."))]
    pub selected_choice: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitAnswerResponse {
    pub message: String,
    pub answer_id: i64,
}
