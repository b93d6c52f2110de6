use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    Json,
};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        claims::SessionClaims,
        dto::{LoginRequest, LoginResponse},
        jwt::JwtKeys,
        password::verify_password,
    },
    error::ApiError,
    response::{Message, Success},
    state::AppState,
    users::services::normalize_email,
    validation,
};

/// POST /login
///
/// Unknown email and wrong password answer with the same message.
#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Success<LoginResponse>, ApiError> {
    let Json(body) = body?;
    validation::check(validation::LOGIN, &body)?;
    let payload: LoginRequest = serde_json::from_value(body).context("decode login body")?;
    let email = normalize_email(&payload.email);

    let Some(user) = state.users.find_active_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(ApiError::BadRequest(Message::user_not_found()));
    };

    if !verify_password(payload.password, user.password_hash.clone()).await? {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::BadRequest(Message::user_not_found()));
    }

    let access_token = JwtKeys::from_ref(&state).issue(&SessionClaims::from(&user))?;

    info!(user_id = user.id, "user logged in");
    Ok(Success::payload(LoginResponse {
        access_token,
        user: user.into(),
    }))
}
