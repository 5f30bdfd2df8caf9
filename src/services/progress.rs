// src/services/progress.rs

use crate::{
    error::QuizResult,
    models::{invitation::QuizParticipant, progress::QuizProgress, user::UserIdentity},
    repositories::Store,
    services::{access::authorize_identity, scoring::Tally},
};

/// Read-only progress of the calling participant. Requires an activated invitation.
pub async fn progress(
    store: &dyn Store,
    identity: &UserIdentity,
    quiz_id: i64,
) -> QuizResult<QuizProgress> {
    let (quiz, activated) = authorize_identity(store, identity, quiz_id).await?;
    let tally = store.tally(activated.participant.id, quiz.id).await?;

    if tally.is_complete() != activated.entry.is_completed() {
        tracing::error!(
            "Ledger entry {} disagrees with journal on completion ({:?})",
            activated.entry.id,
            tally
        );
    }

    Ok(summarize(&activated.entry, &tally))
}

/// Combines ledger timestamps with journal counts.
pub fn summarize(entry: &QuizParticipant, tally: &Tally) -> QuizProgress {
    QuizProgress {
        started_at: entry.started_at,
        completed_at: entry.completed_at,
        total_questions: tally.total_questions,
        answered: tally.answered,
        percent_complete: tally.percent_complete(),
        current_score: tally.current_score(),
        final_score: entry.completed_at.and(entry.score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry() -> QuizParticipant {
        QuizParticipant {
            id: 1,
            participant_id: 2,
            quiz_id: 3,
            invited_at: Utc::now(),
            invitation_token: None,
            accepted_at: Some(Utc::now()),
            started_at: None,
            completed_at: None,
            score: None,
        }
    }

    #[test]
    fn test_untouched_quiz() {
        let p = summarize(
            &entry(),
            &Tally {
                total_questions: 4,
                answered: 0,
                correct: 0,
            },
        );
        assert_eq!(p.percent_complete, 0.0);
        assert_eq!(p.current_score, 0.0);
        assert_eq!(p.final_score, None);
        assert!(p.started_at.is_none());
    }

    #[test]
    fn test_final_score_only_after_completion() {
        let mut qp = entry();
        qp.mark_started(Utc::now());
        qp.mark_completed(Utc::now(), 50.0);

        let p = summarize(
            &qp,
            &Tally {
                total_questions: 2,
                answered: 2,
                correct: 1,
            },
        );
        assert_eq!(p.final_score, Some(50.0));
        assert_eq!(p.percent_complete, 100.0);
        assert!(p.completed_at.is_some());
    }

    #[test]
    fn test_zero_questions_does_not_divide_by_zero() {
        let p = summarize(&entry(), &Tally::default());
        assert_eq!(p.percent_complete, 0.0);
        assert_eq!(p.total_questions, 0);
    }
}
