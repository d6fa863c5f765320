//! Shared application state.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::bridge::BridgeCore;
use crate::notify::ChangeNotifier;
use crate::snapshot;

/// Everything the handlers touch.  One logical owner for all mutable state:
/// handlers lock, mutate, persist, release, then signal, so no two
/// mutations interleave.
pub struct AppState {
    pub core: BridgeCore,
    pub notifier: Arc<ChangeNotifier>,
    pub snapshot_path: PathBuf,
    pub poll_timeout: Duration,
    pub utc_offset_minutes: i32,
}

pub type SharedState = Arc<Mutex<AppState>>;

impl AppState {
    /// Mirror the in-memory state to the snapshot file, best-effort.
    /// Failures are logged and swallowed; memory stays authoritative.
    pub fn persist(&self) {
        if let Err(e) = snapshot::save(&self.snapshot_path, &self.core) {
            crate::blog!(
                "snapshot: failed to write {}: {e}",
                self.snapshot_path.display()
            );
        }
    }
}
