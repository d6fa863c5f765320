//! Shared utility functions for the server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};

/// Build a standard JSON error response.
pub fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, axum::Json(body)).into_response()
}

/// Current time as milliseconds since UNIX epoch.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Format an epoch-milliseconds timestamp as a 12-hour clock display string,
/// e.g. `AM 09:41`, shifted by the configured UTC offset.
pub fn format_clock(timestamp_ms: u64, utc_offset_minutes: i32) -> String {
    let secs = (timestamp_ms / 1000) as i64 + i64::from(utc_offset_minutes) * 60;
    let day_secs = secs.rem_euclid(86400);
    let hour24 = day_secs / 3600;
    let minute = (day_secs % 3600) / 60;
    let meridiem = if hour24 < 12 { "AM" } else { "PM" };
    let hour12 = match hour24 % 12 {
        0 => 12,
        h => h,
    };
    format!("{meridiem} {hour12:02}:{minute:02}")
}

/// Generate an identifier for a server-authored outbound message: SHA-256
/// over the room, content, and timestamp plus a random salt, hex-encoded.
pub fn outbound_message_id(room: &str, content: &str, timestamp_ms: u64) -> String {
    let mut salt = [0u8; 16];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut salt);

    let mut hasher = Sha256::new();
    hasher.update(room.as_bytes());
    hasher.update(content.as_bytes());
    hasher.update(timestamp_ms.to_be_bytes());
    hasher.update(salt);
    hex::encode(hasher.finalize())
}
