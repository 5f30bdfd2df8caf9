// src/models/invitation.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Ledger entry: one participant's lifecycle within one quiz.
/// Represents the 'quiz_participants' table, unique per (participant_id, quiz_id).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct QuizParticipant {
    pub id: i64,
    pub participant_id: i64,
    pub quiz_id: i64,
    pub invited_at: DateTime<Utc>,

    /// Single-use. Cleared once the invitation is accepted.
    #[serde(skip_serializing)]
    pub invitation_token: Option<String>,

    /// Presence means the invitation has been activated.
    pub accepted_at: Option<DateTime<Utc>>,

    /// Stamped by the first recorded answer.
    pub started_at: Option<DateTime<Utc>>,

    /// Stamped when every question has an answer.
    pub completed_at: Option<DateTime<Utc>>,

    /// Final percentage, 0 to 100.
    pub score: Option<f64>,
}

impl QuizParticipant {
    pub fn is_activated(&self) -> bool {
        self.accepted_at.is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Stamps acceptance and burns the token.
    pub fn mark_accepted(&mut self, now: DateTime<Utc>) {
        self.invitation_token = None;
        self.accepted_at = Some(now);
    }

    /// Sets the start timestamp once. Later calls are no-ops.
    pub fn mark_started(&mut self, now: DateTime<Utc>) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    /// Stamps completion and score. Re-invocation overwrites both; the score is
    /// derived from the answer journal so repeated calls agree.
    pub fn mark_completed(&mut self, now: DateTime<Utc>, score: f64) {
        self.completed_at = Some(now);
        self.score = Some(score);
    }
}

/// DTO for `POST /quizzes/{id}/invitations`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvitationRequest {
    /// Also the default username, so it shares the username length cap.
    #[validate(
        email(message = "A valid email is required."),
        length(max = 150, message = "Email must be at most 150 characters.")
    )]
    pub email: String,
    /// Defaults to the email address.
    #[validate(length(min = 3, max = 150))]
    pub username: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvitationResponse {
    pub invitation_id: i64,
    pub participant_id: i64,
    pub quiz_id: i64,
    pub token: String,
    pub invited_at: DateTime<Utc>,
}

/// DTO for `POST /invitations/accept`.
#[derive(Debug, Deserialize, Validate)]
pub struct AcceptInvitationRequest {
    #[validate(length(min = 1, message = "Token is required."))]
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry() -> QuizParticipant {
        QuizParticipant {
            id: 1,
            participant_id: 7,
            quiz_id: 3,
            invited_at: Utc::now(),
            invitation_token: Some("abc".into()),
            accepted_at: None,
            started_at: None,
            completed_at: None,
            score: None,
        }
    }

    #[test]
    fn test_mark_accepted_clears_token() {
        let mut qp = entry();
        assert!(!qp.is_activated());
        qp.mark_accepted(Utc::now());
        assert!(qp.is_activated());
        assert!(qp.invitation_token.is_none());
    }

    #[test]
    fn test_mark_started_is_idempotent() {
        let mut qp = entry();
        let first = Utc::now();
        qp.mark_started(first);
        qp.mark_started(first + Duration::minutes(5));
        assert_eq!(qp.started_at, Some(first));
    }

    #[test]
    fn test_mark_completed_overwrites_with_same_score() {
        let mut qp = entry();
        qp.mark_completed(Utc::now(), 50.0);
        qp.mark_completed(Utc::now(), 50.0);
        assert!(qp.is_completed());
        assert_eq!(qp.score, Some(50.0));
    }

    /// Well-formed address of 160 characters.
    fn long_email() -> String {
        format!("pat@{}.{}.{}.com", "a".repeat(60), "b".repeat(60), "c".repeat(30))
    }

    #[test]
    fn test_invitation_email_fits_username_column() {
        let long = CreateInvitationRequest {
            email: long_email(),
            username: None,
        };
        assert!(long.validate().is_err());

        let ok = CreateInvitationRequest {
            email: "pat@example.com".into(),
            username: None,
        };
        assert!(ok.validate().is_ok());
    }
}
