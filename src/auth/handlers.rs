use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
        extractors::AuthUser,
        repo_types::User,
        services,
    },
    error::ApiError,
    extract::JsonBody,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/session", delete(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/user", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let (user, token) = services::register(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            user,
            token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (user, token) = services::login(&state, payload).await?;
    Ok(Json(LoginResponse { token, user }))
}

#[instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> Result<StatusCode, ApiError> {
    services::logout(&state, &auth).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn get_me(State(state): State<AppState>, auth: AuthUser) -> Result<Json<User>, ApiError> {
    let user = services::current_user(&state, auth.user_id).await?;
    Ok(Json(user))
}

#[cfg(test)]
mod me_tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn user_serialization_hides_password_hash() {
        let user = User {
            id: uuid::Uuid::new_v4(),
            name: "Ada".into(),
            email: "test@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["email"], "test@example.com");
        assert_eq!(json["created_at"], "1970-01-01T00:00:00Z");
        assert!(json.get("password_hash").is_none());
    }
}
