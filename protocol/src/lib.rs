//! Shared wire vocabulary for roomsync nodes.
//!
//! Everything a room carries over gossipsub is defined here so the node,
//! the C ABI layer, and host-side tooling agree on one format. Payloads are
//! JSON; hosts hand entries across the FFI boundary as JSON too.

use serde::{Deserialize, Serialize};

/// Identify protocol string, exchanged between peers on connect.
pub const PROTOCOL_ID: &str = "/roomsync/1.0.0";

/// `message_type` tag for history synchronization envelopes.
pub const HISTORY_SYNC_KIND: &str = "history_sync";

/// Gossipsub topic for a named room.
pub fn room_topic(prefix: &str, room_id: &str) -> String {
    format!("{}-room-{}", prefix, room_id)
}

/// Gossipsub topic every node subscribes to for history broadcasts.
pub fn sync_topic(prefix: &str) -> String {
    format!("{}-history-sync", prefix)
}

/// One visited page as reported by a host device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub url: String,
    pub title: String,
    /// Visit time, milliseconds since the Unix epoch.
    pub visit_time: i64,
    /// Time spent on the page, if the host tracked it.
    pub duration: Option<i64>,
    pub device_id: String,
    pub is_article: bool,
    /// Extracted article text, only present when `is_article` is set.
    pub content: Option<String>,
    pub reading_time: Option<i32>,
}

/// Envelope for a batch of history entries published into a room.
///
/// `message_type` lets receivers route without deserializing the batch;
/// today the only kind is [`HISTORY_SYNC_KIND`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEnvelope {
    pub message_type: String,
    pub entries: Vec<HistoryEntry>,
    pub device_id: String,
    /// Envelope creation time, milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl SyncEnvelope {
    /// Wrap entries from `device_id` into a history-sync envelope.
    pub fn history(entries: Vec<HistoryEntry>, device_id: impl Into<String>) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;
        Self {
            message_type: HISTORY_SYNC_KIND.to_string(),
            entries,
            device_id: device_id.into(),
            timestamp,
        }
    }

    pub fn is_history_sync(&self) -> bool {
        self.message_type == HISTORY_SYNC_KIND
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_naming() {
        assert_eq!(room_topic("roomsync", "abc"), "roomsync-room-abc");
        assert_eq!(sync_topic("roomsync"), "roomsync-history-sync");
    }

    #[test]
    fn envelope_tags_and_timestamps() {
        let env = SyncEnvelope::history(Vec::new(), "device-1");
        assert!(env.is_history_sync());
        assert_eq!(env.device_id, "device-1");
        assert!(env.timestamp > 0);
    }

    #[test]
    fn decodes_host_supplied_entries() {
        // Shape a Swift host actually sends: optional fields omitted or null.
        let json = r#"[
            {"url":"https://example.com/a","title":"A","visit_time":1700000000000,
             "duration":null,"device_id":"mac-1","is_article":false,
             "content":null,"reading_time":null},
            {"url":"https://example.com/b","title":"B","visit_time":1700000001000,
             "duration":42,"device_id":"mac-1","is_article":true,
             "content":"body text","reading_time":3}
        ]"#;
        let entries: Vec<HistoryEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[1].is_article);
        assert_eq!(entries[1].reading_time, Some(3));

        let env = SyncEnvelope::history(entries, "mac-1");
        let bytes = serde_json::to_vec(&env).unwrap();
        let back: SyncEnvelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back.message_type, HISTORY_SYNC_KIND);
        assert_eq!(back.entries.len(), 2);
    }
}
