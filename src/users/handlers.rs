use std::collections::HashMap;

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{
    auth::{
        middleware::{require_session, RequestContext},
        password::hash_password,
    },
    error::ApiError,
    query::{build_filter, Page},
    response::{Message, Success},
    state::AppState,
    users::{
        dto::{InsertUserRequest, UpdateUserRequest, UserPage, UserView},
        repo_types::{NewUser, Role, UserChanges},
        services::{email_taken, is_owner, normalize_email, normalize_phone},
    },
    validation,
};

/// Query keys `GET /user` filters on, in evaluation order.
pub const USER_QUERY_FIELDS: &[&str] = &["name", "startDate", "email", "endDate"];

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/user", get(find_users))
        .route("/user/:id", put(update_user).delete(delete_user))
        .route_layer(middleware::from_fn_with_state(state, require_session));

    Router::new()
        .route("/user", post(insert_user))
        .merge(protected)
}

/// POST /user
#[instrument(skip(state, body))]
pub async fn insert_user(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Success<UserView>, ApiError> {
    let Json(body) = body?;
    validation::check(validation::INSERT_USER, &body)?;
    let payload: InsertUserRequest =
        serde_json::from_value(body).context("decode insert body")?;
    let email = normalize_email(&payload.email);

    if email_taken(state.users.as_ref(), &email, None).await? {
        warn!(%email, "email already registered");
        return Err(ApiError::BadRequest(Message::user_already_exists()));
    }

    let password_hash = hash_password(payload.password, state.config.hash_cost).await?;

    let user = state
        .users
        .create(NewUser {
            name: payload.name.trim().to_string(),
            email,
            password_hash,
            phone: payload.phone.as_deref().and_then(normalize_phone),
            role: Role::Standard,
        })
        .await?;

    info!(user_id = user.id, "user created");
    Ok(Success::payload(user.into()))
}

/// GET /user
///
/// Filters are OR-combined; see [`build_filter`].
#[instrument(skip(state, ctx))]
pub async fn find_users(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Success<UserPage>, ApiError> {
    let session = ctx.session()?;
    let page = Page::from_query(&query);
    let (ordering, filter) = build_filter(&query, USER_QUERY_FIELDS);

    let users = state.users.list(&filter, ordering, page).await?;
    let total = state.users.count(&filter).await?;

    debug!(user_id = session.id, total, returned = users.len(), "users listed");
    Ok(Success::payload(UserPage {
        content: users.into_iter().map(UserView::from).collect(),
        total_elements: total,
        total_pages: page.total_pages(total),
    }))
}

/// PUT /user/{id}
#[instrument(skip(state, ctx, body))]
pub async fn update_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Success<UserView>, ApiError> {
    let session = ctx.session()?;
    let target = id.parse::<i64>().ok();
    if !is_owner(session, target) {
        warn!(user_id = session.id, target = %id, "update refused");
        return Err(ApiError::Forbidden(Message::forbidden((
            "update this user",
            "atualizar este usuário",
        ))));
    }
    let Some(target) = target else {
        return Err(ApiError::BadRequest(Message::user_not_found()));
    };

    let Json(body) = body?;
    validation::check(validation::UPDATE_USER, &body)?;
    let payload: UpdateUserRequest =
        serde_json::from_value(body).context("decode update body")?;

    let email = payload.email.as_deref().map(normalize_email);
    if let Some(email) = &email {
        if email_taken(state.users.as_ref(), email, Some(target)).await? {
            warn!(%email, target, "email already registered");
            return Err(ApiError::BadRequest(Message::user_already_exists()));
        }
    }

    let password_hash = match payload.password {
        Some(password) => Some(hash_password(password, state.config.hash_cost).await?),
        None => None,
    };

    let changes = UserChanges {
        name: payload.name.map(|n| n.trim().to_string()),
        email,
        password_hash,
        phone: payload.phone.as_deref().and_then(normalize_phone),
    };

    let Some(user) = state.users.update(target, changes).await? else {
        warn!(target, "update of unknown user");
        return Err(ApiError::BadRequest(Message::user_not_found()));
    };

    info!(user_id = session.id, target, "user updated");
    Ok(Success::payload(user.into()))
}

/// DELETE /user/{id}
///
/// Soft delete: the row stays with `finished_at` set.
#[instrument(skip(state, ctx))]
pub async fn delete_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Success<()>, ApiError> {
    let session = ctx.session()?;
    let target = id.parse::<i64>().ok();
    if !is_owner(session, target) {
        warn!(user_id = session.id, target = %id, "delete refused");
        return Err(ApiError::Forbidden(Message::forbidden((
            "delete this user",
            "deletar este usuário",
        ))));
    }
    let Some(target) = target else {
        return Err(ApiError::BadRequest(Message::user_not_found()));
    };

    if !state.users.soft_delete(target).await? {
        warn!(target, "delete of unknown user");
        return Err(ApiError::BadRequest(Message::user_not_found()));
    }

    info!(user_id = session.id, target, "user deleted");
    Ok(Success::empty())
}
