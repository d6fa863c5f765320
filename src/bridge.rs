//! Core coordination state for the bridge.
//!
//! Everything the HTTP surface mutates lives here: the bounded dedup set for
//! inbound message ids, the per-room capped message stores, unread counters,
//! sender-profile labels, and the two outbound FIFO queues drained by the
//! external delivery agent.  All methods are plain synchronous mutations;
//! the server serializes access behind one `tokio::sync::Mutex`, so no two
//! operations interleave at sub-operation granularity.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

/// Per-room message cap: on append, only the most recent entries (in stored
/// order) are retained.
pub const MAX_ROOM_MESSAGES: usize = 100;

/// Hard cap on the dedup set.
pub const DEDUP_CAP: usize = 1000;

/// How many ids survive a dedup truncation.
pub const DEDUP_KEEP: usize = 500;

/// A single chat message, immutable once stored.
///
/// `time` is the pre-formatted wall-clock display string; `timestamp` is
/// milliseconds since the UNIX epoch and is the sort key for reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub msg_id: String,
    pub is_me: bool,
    pub sender: String,
    pub content: String,
    pub time: String,
    pub timestamp: u64,
}

/// Outbound reply handed to the delivery agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyItem {
    pub target: String,
    pub content: String,
}

/// Outbound read receipt handed to the delivery agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadItem {
    pub target: String,
}

/// Result of one drain call: at most one item popped from each queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Drained {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplyItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<ReadItem>,
}

impl Drained {
    pub fn is_empty(&self) -> bool {
        self.reply.is_none() && self.read.is_none()
    }
}

/// Outcome of an inbound push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Message was new and has been stored.
    Stored,
    /// Message id was already processed; nothing stored.
    Duplicate,
}

/// Bounded set of processed inbound message ids.
///
/// The set is paired with an insertion-order queue so that truncation keeps
/// exactly the [`DEDUP_KEEP`] most recently inserted ids.  The original
/// system evicted by iterating an unordered set, which only approximated
/// recency; this is the deterministic upgrade.
#[derive(Debug, Default)]
pub struct DedupSet {
    seen: HashSet<String>,
    order: VecDeque<String>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a persisted id list, oldest first.
    pub fn from_ids(ids: Vec<String>) -> Self {
        let mut set = Self::new();
        for id in ids {
            set.insert(id);
        }
        set
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Record an id.  Returns `false` if it was already present.
    /// Exceeding [`DEDUP_CAP`] truncates to the newest [`DEDUP_KEEP`] ids.
    pub fn insert(&mut self, id: String) -> bool {
        if !self.seen.insert(id.clone()) {
            return false;
        }
        self.order.push_back(id);

        if self.seen.len() > DEDUP_CAP {
            while self.order.len() > DEDUP_KEEP {
                if let Some(evicted) = self.order.pop_front() {
                    self.seen.remove(&evicted);
                }
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Ids in insertion order, oldest first, for persistence.
    pub fn ids(&self) -> Vec<String> {
        self.order.iter().cloned().collect()
    }
}

/// Room summary for the chat list view.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    pub target: String,
    pub last: StoredMessage,
    pub unread_count: u64,
    pub profile: String,
}

/// All mutable relay state: conversation stores, unread counters, profile
/// labels, the dedup set, and the outbound queues.
#[derive(Debug, Default)]
pub struct BridgeCore {
    rooms: HashMap<String, Vec<StoredMessage>>,
    unread: HashMap<String, u64>,
    profiles: HashMap<String, String>,
    processed: DedupSet,
    reply_queue: VecDeque<ReplyItem>,
    read_queue: VecDeque<ReadItem>,
}

impl BridgeCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest an inbound message from the notification source.
    ///
    /// Duplicates (by `msg_id`) are rejected without any state change apart
    /// from the dedup lookup.  New messages are appended to the room (capped
    /// at [`MAX_ROOM_MESSAGES`]), the room's unread count is incremented,
    /// and a non-empty `profile` label is attributed to the room.
    pub fn push_inbound(
        &mut self,
        room: &str,
        profile: Option<&str>,
        message: StoredMessage,
    ) -> PushOutcome {
        if !self.processed.insert(message.msg_id.clone()) {
            return PushOutcome::Duplicate;
        }

        if let Some(profile) = profile {
            if !profile.is_empty() {
                self.profiles.insert(room.to_string(), profile.to_string());
            }
        }

        self.append(room, message);
        *self.unread.entry(room.to_string()).or_insert(0) += 1;
        PushOutcome::Stored
    }

    /// Record an outbound message sent by the local operator.
    ///
    /// Appends the self-authored message, resets the room's unread count
    /// (replying implies having read), and enqueues a reply item for the
    /// delivery agent.
    pub fn record_outbound(&mut self, room: &str, message: StoredMessage) {
        let content = message.content.clone();
        self.append(room, message);
        self.unread.insert(room.to_string(), 0);
        self.reply_queue.push_back(ReplyItem {
            target: room.to_string(),
            content,
        });
    }

    /// Apply a read action: reset the unread count and enqueue a read
    /// receipt unless one for this room is already pending.
    pub fn mark_read(&mut self, room: &str) {
        self.unread.insert(room.to_string(), 0);
        if !self.read_queue.iter().any(|item| item.target == room) {
            self.read_queue.push_back(ReadItem {
                target: room.to_string(),
            });
        }
    }

    fn append(&mut self, room: &str, message: StoredMessage) {
        let messages = self.rooms.entry(room.to_string()).or_default();
        messages.push(message);
        if messages.len() > MAX_ROOM_MESSAGES {
            let excess = messages.len() - MAX_ROOM_MESSAGES;
            messages.drain(..excess);
        }
    }

    /// Messages for a room sorted ascending by timestamp, starting at
    /// position `after` in that sorted order.  Unknown rooms yield an empty
    /// list.
    pub fn messages_sorted(&self, room: &str, after: usize) -> Vec<StoredMessage> {
        let mut messages = self.rooms.get(room).cloned().unwrap_or_default();
        messages.sort_by_key(|m| m.timestamp);
        messages.into_iter().skip(after).collect()
    }

    /// Room summaries sorted by most recent activity descending.  Rooms
    /// without any messages are omitted.
    pub fn room_summaries(&self) -> Vec<RoomSummary> {
        let mut summaries: Vec<RoomSummary> = self
            .rooms
            .iter()
            .filter_map(|(room, messages)| {
                let last = messages.last()?.clone();
                Some(RoomSummary {
                    target: room.clone(),
                    last,
                    unread_count: self.unread.get(room).copied().unwrap_or(0),
                    profile: self.profiles.get(room).cloned().unwrap_or_default(),
                })
            })
            .collect();
        summaries.sort_by(|a, b| {
            b.last
                .timestamp
                .cmp(&a.last.timestamp)
                .then_with(|| a.target.cmp(&b.target))
        });
        summaries
    }

    pub fn unread_count(&self, room: &str) -> u64 {
        self.unread.get(room).copied().unwrap_or(0)
    }

    pub fn profile(&self, room: &str) -> String {
        self.profiles.get(room).cloned().unwrap_or_default()
    }

    /// Pop at most one item from each outbound queue.
    pub fn drain(&mut self) -> Drained {
        Drained {
            reply: self.reply_queue.pop_front(),
            read: self.read_queue.pop_front(),
        }
    }

    pub fn pending_replies(&self) -> usize {
        self.reply_queue.len()
    }

    pub fn pending_reads(&self) -> usize {
        self.read_queue.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    // -- Snapshot conversion --

    pub fn export(
        &self,
    ) -> (
        HashMap<String, Vec<StoredMessage>>,
        HashMap<String, u64>,
        Vec<String>,
        HashMap<String, String>,
    ) {
        (
            self.rooms.clone(),
            self.unread.clone(),
            self.processed.ids(),
            self.profiles.clone(),
        )
    }

    pub fn import(
        rooms: HashMap<String, Vec<StoredMessage>>,
        unread: HashMap<String, u64>,
        processed_ids: Vec<String>,
        profiles: HashMap<String, String>,
    ) -> Self {
        Self {
            rooms,
            unread,
            profiles,
            processed: DedupSet::from_ids(processed_ids),
            reply_queue: VecDeque::new(),
            read_queue: VecDeque::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str, content: &str, timestamp: u64, is_me: bool) -> StoredMessage {
        StoredMessage {
            msg_id: id.to_string(),
            is_me,
            sender: if is_me { "Me".to_string() } else { "peer".to_string() },
            content: content.to_string(),
            time: String::new(),
            timestamp,
        }
    }

    #[test]
    fn test_dedup_rejects_replay() {
        let mut set = DedupSet::new();
        assert!(set.insert("a".to_string()));
        assert!(!set.insert("a".to_string()));
        assert!(set.contains("a"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_dedup_truncates_to_newest() {
        let mut set = DedupSet::new();
        for i in 0..=DEDUP_CAP {
            set.insert(format!("id-{i}"));
        }
        assert_eq!(set.len(), DEDUP_KEEP);
        // The newest DEDUP_KEEP ids survive, the oldest are gone.
        assert!(!set.contains("id-0"));
        assert!(!set.contains(&format!("id-{}", DEDUP_CAP - DEDUP_KEEP)));
        assert!(set.contains(&format!("id-{}", DEDUP_CAP - DEDUP_KEEP + 1)));
        assert!(set.contains(&format!("id-{}", DEDUP_CAP)));
    }

    #[test]
    fn test_dedup_roundtrip_preserves_order() {
        let mut set = DedupSet::new();
        set.insert("x".to_string());
        set.insert("y".to_string());
        set.insert("z".to_string());
        let rebuilt = DedupSet::from_ids(set.ids());
        assert_eq!(rebuilt.ids(), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_push_duplicate_stores_once() {
        let mut core = BridgeCore::new();
        let outcome = core.push_inbound("alice", None, message("m1", "hi", 1000, false));
        assert_eq!(outcome, PushOutcome::Stored);
        let outcome = core.push_inbound("alice", None, message("m1", "hi", 1000, false));
        assert_eq!(outcome, PushOutcome::Duplicate);
        assert_eq!(core.messages_sorted("alice", 0).len(), 1);
        assert_eq!(core.unread_count("alice"), 1);
    }

    #[test]
    fn test_room_capped_at_most_recent() {
        let mut core = BridgeCore::new();
        for i in 0..150u64 {
            core.push_inbound("alice", None, message(&format!("m{i}"), "x", i, false));
        }
        let messages = core.messages_sorted("alice", 0);
        assert_eq!(messages.len(), MAX_ROOM_MESSAGES);
        assert_eq!(messages[0].msg_id, "m50");
        assert_eq!(messages[99].msg_id, "m149");
        // Trimming does not touch unread or dedup accounting.
        assert_eq!(core.unread_count("alice"), 150);
        assert_eq!(core.processed_count(), 150);
    }

    #[test]
    fn test_reads_sorted_by_timestamp() {
        let mut core = BridgeCore::new();
        core.push_inbound("bob", None, message("m1", "third", 3000, false));
        core.push_inbound("bob", None, message("m2", "first", 1000, false));
        core.push_inbound("bob", None, message("m3", "second", 2000, false));

        let all = core.messages_sorted("bob", 0);
        let contents: Vec<&str> = all.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);

        // Offset slices into the sorted order, not the stored order.
        let tail = core.messages_sorted("bob", 2);
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].content, "third");

        assert!(core.messages_sorted("bob", 10).is_empty());
    }

    #[test]
    fn test_unread_accounting() {
        let mut core = BridgeCore::new();
        for i in 0..5u64 {
            core.push_inbound("carol", None, message(&format!("m{i}"), "x", i, false));
        }
        assert_eq!(core.unread_count("carol"), 5);
        core.mark_read("carol");
        assert_eq!(core.unread_count("carol"), 0);
        assert_eq!(core.messages_sorted("carol", 0).len(), 5);
        assert!(core.messages_sorted("carol", 0).iter().all(|m| !m.is_me));
    }

    #[test]
    fn test_outbound_resets_unread_and_enqueues_reply() {
        let mut core = BridgeCore::new();
        core.push_inbound("alice", None, message("m1", "hi", 1000, false));
        assert_eq!(core.unread_count("alice"), 1);

        core.record_outbound("alice", message("m2", "yo", 2000, true));
        assert_eq!(core.unread_count("alice"), 0);

        let drained = core.drain();
        assert_eq!(
            drained.reply,
            Some(ReplyItem {
                target: "alice".to_string(),
                content: "yo".to_string(),
            })
        );
    }

    #[test]
    fn test_read_queue_membership_dedup() {
        let mut core = BridgeCore::new();
        core.mark_read("alice");
        core.mark_read("alice");
        core.mark_read("bob");
        assert_eq!(core.pending_reads(), 2);

        // Once drained, the room may be enqueued again.
        let first = core.drain();
        assert_eq!(
            first.read,
            Some(ReadItem {
                target: "alice".to_string()
            })
        );
        core.mark_read("alice");
        assert_eq!(core.pending_reads(), 2);
    }

    #[test]
    fn test_drain_exactly_once() {
        let mut core = BridgeCore::new();
        core.record_outbound("alice", message("m1", "yo", 1000, true));
        core.mark_read("bob");

        let first = core.drain();
        assert!(first.reply.is_some());
        assert!(first.read.is_some());

        let second = core.drain();
        assert!(second.is_empty());
    }

    #[test]
    fn test_queues_are_fifo() {
        let mut core = BridgeCore::new();
        core.record_outbound("alice", message("m1", "one", 1000, true));
        core.record_outbound("bob", message("m2", "two", 2000, true));

        assert_eq!(core.drain().reply.unwrap().content, "one");
        assert_eq!(core.drain().reply.unwrap().content, "two");
    }

    #[test]
    fn test_summaries_sorted_by_activity() {
        let mut core = BridgeCore::new();
        core.push_inbound("old", None, message("m1", "a", 1000, false));
        core.push_inbound("new", Some("pic.jpg"), message("m2", "b", 5000, false));
        core.push_inbound("mid", None, message("m3", "c", 3000, false));

        let summaries = core.room_summaries();
        let order: Vec<&str> = summaries.iter().map(|s| s.target.as_str()).collect();
        assert_eq!(order, vec!["new", "mid", "old"]);
        assert_eq!(summaries[0].profile, "pic.jpg");
        assert_eq!(summaries[0].unread_count, 1);
    }

    #[test]
    fn test_profile_attribution_ignores_empty() {
        let mut core = BridgeCore::new();
        core.push_inbound("alice", Some("face.png"), message("m1", "a", 1, false));
        core.push_inbound("alice", Some(""), message("m2", "b", 2, false));
        assert_eq!(core.profile("alice"), "face.png");
    }
}
