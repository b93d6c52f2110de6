use crate::state::AppState;
use axum::{routing::post, Router};

pub mod claims;
mod dto;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;

pub fn router() -> Router<AppState> {
    Router::new().route("/login", post(handlers::login))
}
