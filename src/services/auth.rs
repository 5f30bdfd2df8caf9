// src/services/auth.rs

use crate::{
    config::Config,
    error::{QuizError, QuizResult},
    models::user::{NewUser, TokenPair, User, UserType},
    repositories::Store,
    utils::{
        hash::{hash_password, verify_password},
        jwt::{TokenType, issue_token_pair, verify_jwt},
    },
};

const BAD_CREDENTIALS: &str = "Invalid username or password.";

/// Resolves a username/password pair to an active account, or `None`.
/// Inactive accounts and accounts without a usable password never authenticate.
pub async fn authenticate(
    store: &dyn Store,
    username: &str,
    password: &str,
) -> QuizResult<Option<User>> {
    let Some(user) = store.find_user_by_username(username).await? else {
        return Ok(None);
    };

    if !user.is_active || !verify_password(password, user.password.as_deref())? {
        return Ok(None);
    }

    Ok(Some(user))
}

/// Authenticates and issues a token pair.
pub async fn login(
    store: &dyn Store,
    config: &Config,
    username: &str,
    password: &str,
) -> QuizResult<(TokenPair, User)> {
    let user = authenticate(store, username, password)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Failed login for '{}'", username);
            QuizError::NotAuthenticated(BAD_CREDENTIALS.to_string())
        })?;

    let tokens = issue_token_pair(&user, config)?;
    tracing::info!("User {} logged in", user.id);
    Ok((tokens, user))
}

/// Exchanges a refresh token for a fresh pair. The account must still exist and be active.
pub async fn refresh(store: &dyn Store, config: &Config, refresh_token: &str) -> QuizResult<TokenPair> {
    let claims = verify_jwt(refresh_token, &config.jwt_secret)
        .map_err(|_| QuizError::NotAuthenticated("Invalid or expired refresh token.".to_string()))?;

    if claims.token_type != TokenType::Refresh {
        return Err(QuizError::NotAuthenticated(
            "Invalid or expired refresh token.".to_string(),
        ));
    }

    let identity = claims.identity()?;
    let user = store
        .find_user_by_id(identity.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| QuizError::NotAuthenticated("User not found.".to_string()))?;

    issue_token_pair(&user, config)
}

/// Creates the configured creator account if it does not exist yet.
/// Returns `true` when an account was created.
pub async fn ensure_creator_account(store: &dyn Store, config: &Config) -> QuizResult<bool> {
    let (Some(username), Some(password)) = (&config.creator_username, &config.creator_password)
    else {
        return Ok(false);
    };

    if store.find_user_by_username(username).await?.is_some() {
        return Ok(false);
    }

    tracing::info!("Seeding creator account: {}", username);
    let password_hash = hash_password(password)?;
    store
        .create_user(NewUser {
            username: username.clone(),
            email: config.creator_email.clone().unwrap_or_default(),
            password_hash: Some(password_hash),
            user_type: UserType::Creator,
            is_active: true,
        })
        .await?;

    Ok(true)
}
