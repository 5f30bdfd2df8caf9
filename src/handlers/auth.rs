// src/handlers/auth.rs

use axum::{Json, body::Bytes, extract::State, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    extractors::ValidatedJson,
    models::user::{ActivationRequest, AuthResponse, LoginRequest, RefreshRequest},
    repositories::SharedStore,
    services::{activation, auth},
    utils::jwt::issue_token_pair,
};

/// Activates a dormant participant account with its invitation token.
///
/// Sets the password, burns the token and returns a fresh token pair.
/// Unknown or already used tokens yield 400.
pub async fn activate(
    State(store): State<SharedStore>,
    State(config): State<Config>,
    ValidatedJson(payload): ValidatedJson<ActivationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = activation::activate(store.as_ref(), &payload.token, &payload.password).await?;
    let tokens = issue_token_pair(&user, &config)?;

    Ok(Json(AuthResponse::new(tokens, &user)))
}

/// Authenticates a user and returns an access/refresh pair.
pub async fn login(
    State(store): State<SharedStore>,
    State(config): State<Config>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    // Any unreadable body (wrong content type, bad JSON, failed validation)
    // is reported as 401 like bad credentials.
    let payload = serde_json::from_slice::<LoginRequest>(&body)
        .ok()
        .filter(|p| p.validate().is_ok())
        .ok_or_else(|| AppError::AuthError("Invalid username or password.".to_string()))?;

    let (tokens, user) = auth::login(store.as_ref(), &config, &payload.username, &payload.password).await?;

    Ok(Json(AuthResponse::new(tokens, &user)))
}

/// Exchanges a refresh token for a new pair.
pub async fn refresh(
    State(store): State<SharedStore>,
    State(config): State<Config>,
    ValidatedJson(payload): ValidatedJson<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let refresh_token = payload
        .refresh
        .ok_or_else(|| AppError::BadRequest("Refresh token is required.".to_string()))?;

    let tokens = auth::refresh(store.as_ref(), &config, &refresh_token).await?;

    Ok(Json(json!({
        "access": tokens.access,
        "refresh": tokens.refresh,
    })))
}
