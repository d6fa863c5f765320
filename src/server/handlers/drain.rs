//! Drain endpoint polled by the external delivery agent.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::server::state::SharedState;

/// GET /get_reply — pop at most one reply and one read receipt.
///
/// The pop happens under the state lock, so concurrent drains never see the
/// same item.  Returns `{}` when both queues are empty.
pub async fn drain_handler(State(state): State<SharedState>) -> Response {
    let drained = {
        let mut st = state.lock().await;
        st.core.drain()
    };

    if let Some(ref reply) = drained.reply {
        crate::blog!(
            "drain: handing reply for {}",
            crate::logging::room_id(&reply.target)
        );
    }
    (StatusCode::OK, axum::Json(drained)).into_response()
}
