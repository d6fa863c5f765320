//! JSON snapshot persistence.
//!
//! The whole relay state is mirrored to a single JSON file after every
//! mutation.  Persistence is strictly best-effort: a failed write leaves the
//! in-memory state authoritative, and a missing or corrupt file at startup
//! loads as empty state.  Writes go to a sibling temp file and are renamed
//! into place, so a crash mid-write cannot destroy the previous snapshot.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bridge::{BridgeCore, StoredMessage};

/// On-disk schema.  Unknown or missing sections default to empty, matching
/// the silent-reset startup behaviour.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub chats: HashMap<String, Vec<StoredMessage>>,
    #[serde(default)]
    pub unread: HashMap<String, u64>,
    #[serde(default)]
    pub processed_ids: Vec<String>,
    #[serde(default)]
    pub profiles: HashMap<String, String>,
}

#[derive(Debug)]
pub enum SnapshotError {
    Io(std::io::Error),
    Serde(serde_json::Error),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Io(e) => write!(f, "io error: {e}"),
            SnapshotError::Serde(e) => write!(f, "serialization error: {e}"),
        }
    }
}

impl std::error::Error for SnapshotError {}

impl From<std::io::Error> for SnapshotError {
    fn from(e: std::io::Error) -> Self {
        SnapshotError::Io(e)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(e: serde_json::Error) -> Self {
        SnapshotError::Serde(e)
    }
}

/// Load relay state from `path`.  Missing or unreadable snapshots yield
/// empty state; the reason is logged but never surfaced.
pub fn load(path: &Path) -> BridgeCore {
    if !path.exists() {
        return BridgeCore::new();
    }
    match read(path) {
        Ok(snapshot) => BridgeCore::import(
            snapshot.chats,
            snapshot.unread,
            snapshot.processed_ids,
            snapshot.profiles,
        ),
        Err(e) => {
            crate::blog!("snapshot: failed to load {}: {e}", path.display());
            BridgeCore::new()
        }
    }
}

fn read(path: &Path) -> Result<Snapshot, SnapshotError> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Write the current relay state to `path` via temp-file-and-rename.
///
/// The outbound queues are deliberately not persisted: their consumer polls
/// continuously, and replaying stale work items after a restart would
/// double-deliver.
pub fn save(path: &Path, core: &BridgeCore) -> Result<(), SnapshotError> {
    let (chats, unread, processed_ids, profiles) = core.export();
    let snapshot = Snapshot {
        chats,
        unread,
        processed_ids,
        profiles,
    };
    let json = serde_json::to_string_pretty(&snapshot)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::PushOutcome;

    fn message(id: &str, timestamp: u64) -> StoredMessage {
        StoredMessage {
            msg_id: id.to_string(),
            is_me: false,
            sender: "peer".to_string(),
            content: "hello".to_string(),
            time: "AM 09:41".to_string(),
            timestamp,
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("chats.json");

        let mut core = BridgeCore::new();
        core.push_inbound("alice", Some("face.png"), message("m1", 1000));
        core.push_inbound("alice", None, message("m2", 2000));
        save(&path, &core).expect("save snapshot");

        let mut reloaded = load(&path);
        assert_eq!(reloaded.messages_sorted("alice", 0).len(), 2);
        assert_eq!(reloaded.unread_count("alice"), 2);
        assert_eq!(reloaded.profile("alice"), "face.png");
        // Dedup membership survives the restart.
        assert_eq!(
            reloaded.push_inbound("alice", None, message("m1", 1000)),
            PushOutcome::Duplicate
        );
    }

    #[test]
    fn test_missing_snapshot_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let core = load(&dir.path().join("nope.json"));
        assert_eq!(core.room_count(), 0);
        assert_eq!(core.processed_count(), 0);
    }

    #[test]
    fn test_corrupt_snapshot_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("chats.json");
        fs::write(&path, "{not json at all").expect("write garbage");
        let core = load(&path);
        assert_eq!(core.room_count(), 0);
    }

    #[test]
    fn test_partial_snapshot_defaults_missing_sections() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("chats.json");
        fs::write(&path, r#"{"unread": {"alice": 3}}"#).expect("write partial");
        let core = load(&path);
        assert_eq!(core.unread_count("alice"), 3);
        assert_eq!(core.room_count(), 0);
    }
}
