// src/services/submission.rs

use chrono::Utc;

use crate::{
    error::{QuizError, QuizResult},
    models::{
        answer::{NewAnswer, ParticipantAnswer},
        user::UserIdentity,
    },
    repositories::Store,
    services::access::{authorize, require_quiz, resolve_participant},
};

/// Records one answer. Answers are write-once: a second submission for the
/// same question fails with `AlreadyAnswered`.
///
/// Checks run in order: participant profile, quiz/question existence,
/// activated invitation, choice ownership. The journal insert, start stamp and
/// completion scoring then commit together.
pub async fn submit_answer(
    store: &dyn Store,
    identity: &UserIdentity,
    quiz_id: i64,
    question_id: i64,
    choice_id: i64,
) -> QuizResult<ParticipantAnswer> {
    let participant = resolve_participant(store, identity).await?;

    let quiz = require_quiz(store, quiz_id).await?;
    let question = store
        .find_question(question_id)
        .await?
        .filter(|q| q.quiz_id == quiz.id)
        .ok_or(QuizError::NotFound("Question"))?;

    let activated = authorize(store, participant, quiz.id).await?;

    store
        .find_choice(choice_id)
        .await?
        .filter(|c| c.question_id == question.id)
        .ok_or(QuizError::InvalidChoice)?;

    let recorded = store
        .record_answer(
            NewAnswer {
                entry_id: activated.entry.id,
                participant_id: activated.participant.id,
                quiz_id: quiz.id,
                question_id: question.id,
                selected_choice_id: choice_id,
            },
            Utc::now(),
        )
        .await
        .inspect_err(|e| {
            if matches!(e, QuizError::AlreadyAnswered) {
                tracing::warn!(
                    "Participant {} resubmitted question {}",
                    activated.participant.id,
                    question.id
                );
            }
        })?;

    tracing::info!(
        "Answer {} recorded: participant={}, quiz={}, question={}",
        recorded.answer.id,
        activated.participant.id,
        quiz.id,
        question.id
    );

    if let (Some(completed_at), Some(score)) = (recorded.entry.completed_at, recorded.entry.score) {
        tracing::info!(
            "Participant {} completed quiz {} at {} with score {:.2}",
            activated.participant.id,
            quiz.id,
            completed_at,
            score
        );
    }

    Ok(recorded.answer)
}
