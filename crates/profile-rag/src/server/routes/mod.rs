//! API routes for the chat server

pub mod chat;
pub mod health;

use axum::{extract::DefaultBodyLimit, routing::post, Router};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_body_size: usize) -> Router<AppState> {
    Router::new().route(
        "/chat/",
        post(chat::chat).layer(DefaultBodyLimit::max(max_body_size)),
    )
}
