// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::{AppError, QuizError, QuizResult},
    models::user::{TokenPair, User, UserIdentity, UserType},
};

/// Distinguishes short-lived access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    /// 'creator' or 'participant'.
    pub role: String,
    pub token_type: TokenType,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    /// Resolves the claims into the identity passed to the protocols.
    pub fn identity(&self) -> QuizResult<UserIdentity> {
        let user_id = self
            .sub
            .parse::<i64>()
            .map_err(|_| QuizError::NotAuthenticated("Invalid token subject".to_string()))?;
        let role = self
            .role
            .parse::<UserType>()
            .map_err(QuizError::NotAuthenticated)?;

        Ok(UserIdentity { user_id, role })
    }
}

/// Signs a new JWT for the user.
pub fn sign_jwt(
    id: i64,
    role: &str,
    token_type: TokenType,
    secret: &str,
    expiration_seconds: u64,
) -> QuizResult<String> {
    // Calculate expiration: current time + expiration_seconds
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| QuizError::Invariant(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: id.to_string(),
        role: role.to_owned(),
        token_type,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| QuizError::Invariant(e.to_string()))
}

/// Issues an access/refresh pair for `user`.
pub fn issue_token_pair(user: &User, config: &Config) -> QuizResult<TokenPair> {
    Ok(TokenPair {
        access: sign_jwt(
            user.id,
            &user.user_type,
            TokenType::Access,
            &config.jwt_secret,
            config.jwt_expiration,
        )?,
        refresh: sign_jwt(
            user.id,
            &user.user_type,
            TokenType::Refresh,
            &config.jwt_secret,
            config.jwt_refresh_expiration,
        )?,
    })
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise `NotAuthenticated`.
pub fn verify_jwt(token: &str, secret: &str) -> QuizResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| QuizError::NotAuthenticated("Invalid or expired token".to_string()))?;

    Ok(token_data.claims)
}

/// Axum Middleware: Authentication.
///
/// Validates the 'Authorization: Bearer <token>' header. Only access tokens are accepted.
/// If valid, injects `Claims` and the resolved `UserIdentity` into the request extensions.
/// If invalid, returns 401 Unauthorized.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => {
            return Err(AppError::AuthError(
                "Authentication credentials were not provided.".to_string(),
            ));
        }
    };

    let claims = verify_jwt(token, &config.jwt_secret)?;
    if claims.token_type != TokenType::Access {
        return Err(AppError::AuthError("Access token required".to_string()));
    }
    let identity = claims.identity()?;

    req.extensions_mut().insert(claims);
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Axum Middleware: Creator Authorization.
///
/// Must be used AFTER `auth_middleware`. Rejects non-creators with 403 Forbidden.
pub async fn creator_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let identity = req
        .extensions()
        .get::<UserIdentity>()
        .ok_or_else(|| AppError::AuthError("Not authenticated".to_string()))?;

    if identity.role != UserType::Creator {
        return Err(AppError::Forbidden(
            "Only quiz creators may perform this action.".to_string(),
        ));
    }

    Ok(next.run(req).await)
}
