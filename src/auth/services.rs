use anyhow::Context;
use axum::extract::FromRef;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        events::AuthEvent,
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::{NewUser, User},
    },
    error::ApiError,
    state::AppState,
    validation::{field_error, single},
};

fn email_taken() -> ApiError {
    ApiError::Validation(single(
        "email",
        field_error("unique", "The email has already been taken.".into()),
    ))
}

/// Creates the account and returns it with a fresh bearer token.
pub async fn register(
    state: &AppState,
    mut payload: RegisterRequest,
) -> Result<(User, String), ApiError> {
    payload.email = payload.email.map(|e| e.to_lowercase());
    payload.check()?;

    let name = payload.name.unwrap_or_default();
    let email = payload.email.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(email_taken());
    }

    let password_hash = hash_password(&password)?;
    let user = state
        .users
        .create(NewUser {
            name,
            email,
            password_hash,
        })
        .await?
        .ok_or_else(email_taken)?;

    state.events.emit(AuthEvent::Registered {
        user_id: user.id,
        email: user.email.clone(),
    });

    let token = JwtKeys::from_ref(state).sign(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((user, token))
}

/// Checks credentials; unknown email and wrong password look the same to the caller.
pub async fn login(
    state: &AppState,
    mut payload: LoginRequest,
) -> Result<(User, String), ApiError> {
    payload.email = payload.email.map(|e| e.to_lowercase());
    payload.validate()?;

    let email = payload.email.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = JwtKeys::from_ref(state).sign(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((user, token))
}

/// Revokes the token the caller authenticated with. Other tokens stay valid.
pub async fn logout(state: &AppState, auth: &AuthUser) -> Result<(), ApiError> {
    let expires_at = OffsetDateTime::from_unix_timestamp(auth.claims.exp as i64)
        .context("token expiry out of range")?;
    state
        .revocations
        .revoke(auth.claims.jti, auth.user_id, expires_at)
        .await?;
    info!(user_id = %auth.user_id, jti = %auth.claims.jti, "token revoked");
    Ok(())
}

pub async fn current_user(state: &AppState, user_id: Uuid) -> Result<User, ApiError> {
    state.users.find_by_id(user_id).await?.ok_or_else(|| {
        warn!(%user_id, "token subject no longer exists");
        ApiError::Unauthorized("User not found".into())
    })
}
