use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, warn};

use super::{claims::SessionClaims, jwt::JwtKeys};
use crate::{error::ApiError, state::AppState};

/// Per-request values set up by middleware. `session` is only filled in
/// after `require_session` accepted the bearer token.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub session: Option<SessionClaims>,
}

impl RequestContext {
    pub fn session(&self) -> Result<&SessionClaims, ApiError> {
        self.session.as_ref().ok_or(ApiError::Unauthorized)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Rejects with 401 unless the request carries a valid bearer token whose
/// claims still match an active user.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = authenticate(&state, request.headers()).await?;
    request.extensions_mut().insert(RequestContext {
        session: Some(session),
    });
    Ok(next.run(request).await)
}

fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<SessionClaims, ApiError> {
    let Some(header) = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) else {
        debug!("missing Authorization header");
        return Err(ApiError::Unauthorized);
    };

    let Some(token) = bearer_token(header) else {
        debug!("invalid auth scheme");
        return Err(ApiError::Unauthorized);
    };

    let claims = JwtKeys::from_ref(state).verify(token).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        ApiError::Unauthorized
    })?;

    let (Some(id), Some(name), Some(email)) =
        (claims.user.id, claims.user.name.as_deref(), claims.user.email.as_deref())
    else {
        warn!("token without identity fields");
        return Err(ApiError::Unauthorized);
    };

    let user = state
        .users
        .find_active_session(id, name, email, claims.user.role)
        .await
        .map_err(|e| {
            error!(error = ?e, user_id = id, "session lookup failed");
            ApiError::Unauthorized
        })?;

    match user {
        Some(user) => Ok(SessionClaims::from(&user)),
        None => {
            warn!(user_id = id, "token no longer matches an active user");
            Err(ApiError::Unauthorized)
        }
    }
}
