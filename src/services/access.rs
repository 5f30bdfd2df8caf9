// src/services/access.rs

use crate::{
    error::{QuizError, QuizResult},
    models::{
        invitation::QuizParticipant,
        quiz::Quiz,
        user::{Participant, UserIdentity},
    },
    repositories::Store,
};

/// A participant holding an accepted invitation for one quiz.
#[derive(Debug, Clone)]
pub struct ActivatedParticipant {
    pub participant: Participant,
    pub entry: QuizParticipant,
}

/// Maps an identity to its participant profile.
pub async fn resolve_participant(
    store: &dyn Store,
    identity: &UserIdentity,
) -> QuizResult<Participant> {
    store
        .find_participant_by_user(identity.user_id)
        .await?
        .ok_or(QuizError::NoParticipantProfile)
}

pub async fn require_quiz(store: &dyn Store, quiz_id: i64) -> QuizResult<Quiz> {
    store
        .find_quiz(quiz_id)
        .await?
        .ok_or(QuizError::NotFound("Quiz"))
}

/// The participant must hold a ledger entry for the quiz with `accepted_at` set.
/// Never invited and invited-but-not-activated are both `NotAuthorized`.
pub async fn authorize(
    store: &dyn Store,
    participant: Participant,
    quiz_id: i64,
) -> QuizResult<ActivatedParticipant> {
    let entry = store
        .find_invitation(participant.id, quiz_id)
        .await?
        .filter(QuizParticipant::is_activated)
        .ok_or_else(|| {
            tracing::warn!(
                "Participant {} is not activated for quiz {}",
                participant.id,
                quiz_id
            );
            QuizError::NotAuthorized
        })?;

    Ok(ActivatedParticipant { participant, entry })
}

/// Identity, quiz existence and activation checks in that order.
pub async fn authorize_identity(
    store: &dyn Store,
    identity: &UserIdentity,
    quiz_id: i64,
) -> QuizResult<(Quiz, ActivatedParticipant)> {
    let participant = resolve_participant(store, identity).await?;
    let quiz = require_quiz(store, quiz_id).await?;
    let activated = authorize(store, participant, quiz.id).await?;
    Ok((quiz, activated))
}

/// Creator-side guard: the quiz must exist and belong to the caller.
pub async fn require_owned_quiz(
    store: &dyn Store,
    identity: &UserIdentity,
    quiz_id: i64,
) -> QuizResult<Quiz> {
    let quiz = require_quiz(store, quiz_id).await?;
    if quiz.creator_id != identity.user_id {
        return Err(QuizError::NotQuizOwner);
    }
    Ok(quiz)
}
