// src/services/ledger.rs

use chrono::Utc;

use crate::{
    error::{QuizError, QuizResult},
    models::{
        invitation::{CreateInvitationRequest, QuizParticipant},
        user::{NewUser, Participant, UserIdentity, UserType},
    },
    repositories::Store,
    services::access::require_owned_quiz,
    utils::token::generate_invitation_token,
};

/// Opens a ledger entry for (participant, quiz) with a fresh single-use token.
///
/// Fails with `DuplicateInvitation` when the pair already has an entry.
pub async fn create_invitation(
    store: &dyn Store,
    participant_id: i64,
    quiz_id: i64,
) -> QuizResult<QuizParticipant> {
    let token = generate_invitation_token();
    let entry = store
        .create_invitation(participant_id, quiz_id, &token, Utc::now())
        .await?;

    tracing::info!(
        "Invitation {} issued: participant={}, quiz={}",
        entry.id,
        participant_id,
        quiz_id
    );
    Ok(entry)
}

/// Creator flow: finds or creates a dormant participant account for the
/// email address and invites it to the creator's quiz.
pub async fn invite_participant(
    store: &dyn Store,
    creator: &UserIdentity,
    quiz_id: i64,
    req: &CreateInvitationRequest,
) -> QuizResult<(Participant, QuizParticipant)> {
    let quiz = require_owned_quiz(store, creator, quiz_id).await?;

    let user = match store.find_user_by_email(&req.email).await? {
        Some(user) => {
            if user.role().ok() != Some(UserType::Participant) {
                return Err(QuizError::Validation(format!(
                    "User '{}' is not a participant.",
                    req.email
                )));
            }
            user
        }
        None => {
            // Dormant until activated through the invitation token.
            let user = store
                .create_user(NewUser {
                    username: req.username.clone().unwrap_or_else(|| req.email.clone()),
                    email: req.email.clone(),
                    password_hash: None,
                    user_type: UserType::Participant,
                    is_active: false,
                })
                .await?;
            tracing::info!("Created dormant participant account {}", user.id);
            user
        }
    };

    let participant = store.ensure_participant(user.id).await?;
    let entry = create_invitation(store, participant.id, quiz.id).await?;

    Ok((participant, entry))
}
