// src/services/activation.rs

use chrono::Utc;

use crate::{
    error::{QuizError, QuizResult},
    models::{
        invitation::QuizParticipant,
        user::{User, UserIdentity},
    },
    repositories::Store,
    services::access::resolve_participant,
    utils::hash::hash_password,
};

/// Consumes an invitation token and turns the dormant account into an active one.
///
/// Unknown, malformed and already-consumed tokens all fail with `InvalidToken`.
/// The credential update, activation, token burn and acceptance stamp happen
/// as one unit in the store.
pub async fn activate(store: &dyn Store, token: &str, password: &str) -> QuizResult<User> {
    // Cheap rejection before paying for the hash; the store re-checks under lock.
    if store.find_invitation_by_token(token).await?.is_none() {
        tracing::warn!("Activation attempted with unknown token");
        return Err(QuizError::InvalidToken);
    }

    let password_hash = hash_password(password)?;
    let activated = store
        .activate_account(token, &password_hash, Utc::now())
        .await
        .inspect_err(|e| tracing::warn!("Activation rejected: {}", e))?;

    tracing::info!(
        "User {} activated through invitation {} (quiz {})",
        activated.user.id,
        activated.entry.id,
        activated.entry.quiz_id
    );
    Ok(activated.user)
}

/// Accepts a further invitation for an already active participant.
/// The credential is left unchanged.
pub async fn accept_invitation(
    store: &dyn Store,
    identity: &UserIdentity,
    token: &str,
) -> QuizResult<QuizParticipant> {
    let participant = resolve_participant(store, identity).await?;
    let entry = store
        .accept_invitation(participant.id, token, Utc::now())
        .await?;

    tracing::info!(
        "Participant {} accepted invitation {} (quiz {})",
        participant.id,
        entry.id,
        entry.quiz_id
    );
    Ok(entry)
}
