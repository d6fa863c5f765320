//! Configuration types and constants for the chatbridge server.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Long-poll timeout for `/subscribe`.
pub(crate) const DEFAULT_POLL_TIMEOUT_SECS: u64 = 20;

/// Display-time offset applied when formatting message clock strings
/// (+09:00, the timezone of the bridged phone).
pub(crate) const DEFAULT_UTC_OFFSET_MINUTES: i32 = 540;

/// Chat relay bridging a mobile notification source and a browser reply UI.
///
/// Inbound messages arrive on POST /push, the browser reads rooms and sends
/// replies, and an external delivery agent polls GET /get_reply for outbound
/// work. Configuration can be set via CLI arguments or environment
/// variables. CLI arguments take precedence over environment variables.
#[derive(Parser, Debug)]
#[command(name = "chatbridge", version, about)]
pub struct Cli {
    /// HTTP server bind address [env: CHATBRIDGE_BIND] [default: 0.0.0.0:8000]
    #[arg(long, short = 'b')]
    pub bind: Option<String>,

    /// Snapshot file path [env: CHATBRIDGE_SNAPSHOT] [default: chats.json]
    #[arg(long, short = 's')]
    pub snapshot: Option<PathBuf>,

    /// Long-poll timeout in seconds [env: CHATBRIDGE_POLL_TIMEOUT_SECS]
    #[arg(long)]
    pub poll_timeout_secs: Option<u64>,

    /// Display-time UTC offset in minutes [env: CHATBRIDGE_UTC_OFFSET_MINUTES]
    #[arg(long)]
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub snapshot_path: PathBuf,
    pub poll_timeout: Duration,
    pub utc_offset_minutes: i32,
}

impl Config {
    pub fn from_cli_and_env(cli: Cli) -> Self {
        let bind_addr = cli
            .bind
            .or_else(|| std::env::var("CHATBRIDGE_BIND").ok())
            .unwrap_or_else(|| "0.0.0.0:8000".to_string());

        let snapshot_path = cli
            .snapshot
            .or_else(|| std::env::var("CHATBRIDGE_SNAPSHOT").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("chats.json"));

        let poll_timeout_secs = cli
            .poll_timeout_secs
            .or_else(|| {
                std::env::var("CHATBRIDGE_POLL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .unwrap_or(DEFAULT_POLL_TIMEOUT_SECS);

        let utc_offset_minutes = cli
            .utc_offset_minutes
            .or_else(|| {
                std::env::var("CHATBRIDGE_UTC_OFFSET_MINUTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .unwrap_or(DEFAULT_UTC_OFFSET_MINUTES);

        Self {
            bind_addr,
            snapshot_path,
            poll_timeout: Duration::from_secs(poll_timeout_secs),
            utc_offset_minutes,
        }
    }
}
