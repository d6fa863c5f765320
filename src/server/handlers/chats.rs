//! Room listing, opening, and read-receipt handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::server::state::SharedState;

/// GET /chats — room summaries sorted by most recent activity descending.
/// Read-only: no unread reset, no signal.
pub async fn list_chats_handler(State(state): State<SharedState>) -> Response {
    let st = state.lock().await;
    let summaries = st.core.room_summaries();
    (StatusCode::OK, axum::Json(serde_json::json!(summaries))).into_response()
}

/// GET /chat/:room — open a room view.
///
/// Side effects of a read action: unread reset, read receipt enqueued,
/// snapshot written, notifier signalled.
pub async fn open_chat_handler(
    State(state): State<SharedState>,
    Path(room): Path<String>,
) -> Response {
    let (profile, notifier) = {
        let mut st = state.lock().await;
        st.core.mark_read(&room);
        st.persist();
        (st.core.profile(&room), Arc::clone(&st.notifier))
    };
    notifier.signal();

    let body = serde_json::json!({
        "status": "ok",
        "target": room,
        "profile": profile,
    });
    (StatusCode::OK, axum::Json(body)).into_response()
}

/// POST /read/:room — explicit read receipt; same side effects as opening
/// the room.
pub async fn mark_read_handler(
    State(state): State<SharedState>,
    Path(room): Path<String>,
) -> Response {
    let notifier = {
        let mut st = state.lock().await;
        st.core.mark_read(&room);
        st.persist();
        Arc::clone(&st.notifier)
    };
    notifier.signal();

    crate::blog!("read: {}", crate::logging::room_id(&room));
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({"status": "ok"})),
    )
        .into_response()
}
