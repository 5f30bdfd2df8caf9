// src/models/progress.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read model for `GET /quizzes/{id}/progress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizProgress {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_questions: i64,
    pub answered: i64,
    pub percent_complete: f64,
    /// Running score over the answered subset.
    pub current_score: f64,
    /// `None` until completion.
    pub final_score: Option<f64>,
}
