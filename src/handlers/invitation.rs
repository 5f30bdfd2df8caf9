// src/handlers/invitation.rs

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
        invitation::{AcceptInvitationRequest, CreateInvitationRequest, InvitationResponse},
        user::UserIdentity,
    },
    repositories::SharedStore,
    services::{activation, ledger},
};

/// Invites a participant (by email) to one of the caller's quizzes.
/// Creator only. Returns the single-use token to hand to the participant.
pub async fn create_invitation(
    State(store): State<SharedStore>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(quiz_id): AppPath<i64>,
    ValidatedJson(payload): ValidatedJson<CreateInvitationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (participant, entry) =
        ledger::invite_participant(store.as_ref(), &identity, quiz_id, &payload).await?;

    let token = entry.invitation_token.clone().ok_or_else(|| {
        AppError::InternalServerError(format!("invitation {} was created without a token", entry.id))
    })?;

    Ok((
        StatusCode::CREATED,
        Json(InvitationResponse {
            invitation_id: entry.id,
            participant_id: participant.id,
            quiz_id: entry.quiz_id,
            token,
            invited_at: entry.invited_at,
        }),
    ))
}

/// Accepts an invitation on behalf of an already active participant.
pub async fn accept_invitation(
    State(store): State<SharedStore>,
    Extension(identity): Extension<UserIdentity>,
    ValidatedJson(payload): ValidatedJson<AcceptInvitationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let entry = activation::accept_invitation(store.as_ref(), &identity, &payload.token).await?;
    Ok(Json(entry))
}
