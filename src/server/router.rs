//! Axum router construction.

use axum::response::Redirect;
use axum::routing::{get, post};
use axum::Router;

use crate::server::handlers;
use crate::server::state::SharedState;

/// Build the complete Axum router.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/chats") }))
        .route("/health", get(handlers::health::health_handler))
        // Browser UI
        .route("/chats", get(handlers::chats::list_chats_handler))
        .route("/chat/:room", get(handlers::chats::open_chat_handler))
        .route("/read/:room", post(handlers::chats::mark_read_handler))
        .route(
            "/messages/:room",
            get(handlers::messages::list_messages_handler),
        )
        .route("/send", post(handlers::messages::send_handler))
        .route("/subscribe", get(handlers::subscribe::subscribe_handler))
        // Phone-side notification agent
        .route("/push", post(handlers::messages::push_handler))
        // External delivery agent
        .route("/get_reply", get(handlers::drain::drain_handler))
        .with_state(state)
}
