//! Health check endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::server::state::SharedState;

pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let st = state.lock().await;
    let body = serde_json::json!({
        "status": "ok",
        "rooms": st.core.room_count(),
        "processed_ids": st.core.processed_count(),
        "pending_replies": st.core.pending_replies(),
        "pending_reads": st.core.pending_reads(),
    });
    (StatusCode::OK, axum::Json(body))
}
