use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::{
    response::{Message, Status},
    validation::FieldError,
};

/// Every failure a handler can answer with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed validation ({} fields)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("bad request: {}", .0.english)]
    BadRequest(Message),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {}", .0.english)]
    Forbidden(Message),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: Status,
    message: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) | ApiError::Internal(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (message, errors) = match self {
            ApiError::Validation(errors) => (Message::invalid_fields(), Some(errors)),
            ApiError::BadRequest(message) | ApiError::Forbidden(message) => (message, None),
            ApiError::Unauthorized => (Message::unauthorized(), None),
            ApiError::Internal(e) => {
                // Detail stays in the logs, the client gets the generic text.
                error!(error = ?e, "unexpected failure");
                (Message::unexpected(), None)
            }
        };
        let body = ErrorBody {
            status: Status::Error,
            message,
            errors,
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection, "rejected request body");
        ApiError::BadRequest(Message::malformed_body())
    }
}
