//! chatbridge server: HTTP surface over the coordination core.
//!
//! Parses configuration, loads the snapshot, and serves the REST + long-poll
//! API until shutdown.

pub mod config;
pub mod handlers;
pub mod router;
pub mod state;
pub mod utils;

use std::sync::Arc;

use clap::Parser;
use tokio::sync::Mutex;

use crate::notify::ChangeNotifier;
use crate::snapshot;

use config::{Cli, Config};
use state::{AppState, SharedState};

/// Entry point: parse CLI, load snapshot, start server.
pub async fn run() {
    let cli = Cli::parse();
    let config = Config::from_cli_and_env(cli);

    crate::logging::init();

    crate::blog!("chatbridge starting");
    crate::blog!("  snapshot: {}", config.snapshot_path.display());
    crate::blog!("  long-poll timeout: {}s", config.poll_timeout.as_secs());

    let core = snapshot::load(&config.snapshot_path);
    crate::blog!(
        "  loaded {} room(s), {} processed id(s)",
        core.room_count(),
        core.processed_count()
    );

    let state: SharedState = Arc::new(Mutex::new(AppState {
        core,
        notifier: Arc::new(ChangeNotifier::new()),
        snapshot_path: config.snapshot_path.clone(),
        poll_timeout: config.poll_timeout,
        utc_offset_minutes: config.utc_offset_minutes,
    }));

    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap_or_else(|error| panic!("failed to bind {}: {error}", config.bind_addr));
    crate::blog!("chatbridge listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .unwrap_or_else(|error| panic!("server error: {error}"));
}
