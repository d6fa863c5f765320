//! Inbound push, outbound send, and message fetch handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Form;
use serde::Deserialize;

use crate::bridge::{PushOutcome, StoredMessage};
use crate::server::state::SharedState;
use crate::server::utils::{api_error, format_clock, now_millis, outbound_message_id};

/// Body of POST /push, as sent by the phone-side notification agent.
#[derive(Deserialize)]
pub struct PushRequest {
    pub msg_id: String,
    pub room_name: String,
    pub sender: String,
    pub content: String,
    pub timestamp: u64,
    #[serde(default)]
    pub profile: Option<String>,
}

/// POST /push — ingest an inbound message.
///
/// Duplicate msg_ids are reported via the status field, not an error, and
/// cause no mutation, no snapshot write, and no signal.
pub async fn push_handler(
    State(state): State<SharedState>,
    axum::Json(req): axum::Json<PushRequest>,
) -> Response {
    let (outcome, notifier) = {
        let mut st = state.lock().await;
        let message = StoredMessage {
            msg_id: req.msg_id.clone(),
            is_me: false,
            sender: req.sender,
            content: req.content,
            time: format_clock(req.timestamp, st.utc_offset_minutes),
            timestamp: req.timestamp,
        };
        let outcome = st
            .core
            .push_inbound(&req.room_name, req.profile.as_deref(), message);
        if outcome == PushOutcome::Stored {
            st.persist();
        }
        (outcome, Arc::clone(&st.notifier))
    };

    match outcome {
        PushOutcome::Duplicate => (
            StatusCode::OK,
            axum::Json(serde_json::json!({"status": "duplicate"})),
        )
            .into_response(),
        PushOutcome::Stored => {
            notifier.signal();
            crate::blog!(
                "push: stored {} in {}",
                crate::logging::msg_id(&req.msg_id),
                crate::logging::room_id(&req.room_name)
            );
            (
                StatusCode::OK,
                axum::Json(serde_json::json!({"status": "ok"})),
            )
                .into_response()
        }
    }
}

/// Form body of POST /send.  `sender` names the target room.
#[derive(Deserialize)]
pub struct SendForm {
    pub sender: String,
    pub content: String,
}

/// POST /send — outbound message from the local operator.
///
/// The server assigns the identifier and timestamp, appends the message as
/// self-authored, resets unread (replying implies having read), and
/// enqueues a reply item for the delivery agent.
pub async fn send_handler(
    State(state): State<SharedState>,
    Form(form): Form<SendForm>,
) -> Response {
    if form.content.trim().is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "content cannot be empty");
    }

    let timestamp = now_millis();
    let msg_id = outbound_message_id(&form.sender, &form.content, timestamp);

    let notifier = {
        let mut st = state.lock().await;
        let message = StoredMessage {
            msg_id: msg_id.clone(),
            is_me: true,
            sender: "Me".to_string(),
            content: form.content,
            time: format_clock(timestamp, st.utc_offset_minutes),
            timestamp,
        };
        st.core.record_outbound(&form.sender, message);
        st.persist();
        Arc::clone(&st.notifier)
    };
    notifier.signal();

    crate::blog!(
        "send: queued {} for {}",
        crate::logging::msg_id(&msg_id),
        crate::logging::room_id(&form.sender)
    );
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({"status": "ok"})),
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct MessagesQuery {
    #[serde(default)]
    after: usize,
}

/// GET /messages/:room?after=N — messages sorted ascending by timestamp
/// from position N in that order.  Fetching counts as a read action.
pub async fn list_messages_handler(
    State(state): State<SharedState>,
    Path(room): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> Response {
    let (messages, notifier) = {
        let mut st = state.lock().await;
        st.core.mark_read(&room);
        st.persist();
        (
            st.core.messages_sorted(&room, query.after),
            Arc::clone(&st.notifier),
        )
    };
    notifier.signal();

    (StatusCode::OK, axum::Json(serde_json::json!(messages))).into_response()
}
