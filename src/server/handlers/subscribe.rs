//! Long-poll subscription handler.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::notify::WaitOutcome;
use crate::server::state::SharedState;

/// GET /subscribe — block until any mutation signals the notifier, or until
/// the configured timeout elapses.
///
/// The wait happens with the state lock released, so subscribers never stall
/// other requests.  If the client disconnects early, dropping this future
/// deregisters the waiter.  The outcome is exposed in the body so callers
/// can tell a real update from an idle timeout.
pub async fn subscribe_handler(State(state): State<SharedState>) -> Response {
    let (notifier, timeout) = {
        let st = state.lock().await;
        (Arc::clone(&st.notifier), st.poll_timeout)
    };

    let status = match notifier.wait(timeout).await {
        WaitOutcome::Fired => "updated",
        WaitOutcome::TimedOut => "timeout",
    };
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({"status": status})),
    )
        .into_response()
}
