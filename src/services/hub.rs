use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::analysis::types::ClassroomSnapshot;
use crate::services::store::SnapshotStore;

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Frames pushed to stream subscribers.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubFrame<'a> {
    Current { data: &'a ClassroomSnapshot },
    Snapshot { data: &'a ClassroomSnapshot },
    Heartbeat { timestamp: String },
    Pong,
}

impl HubFrame<'_> {
    pub fn heartbeat() -> Self {
        HubFrame::Heartbeat {
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn to_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

pub struct Subscription {
    pub connection_id: Uuid,
    pub classroom_id: String,
    pub receiver: mpsc::Receiver<String>,
}

/// Messaging port for per-classroom snapshot fan-out.
pub trait SnapshotFanout: Send + Sync {
    fn connect(&self, classroom_id: &str) -> Subscription;
    fn broadcast(&self, classroom_id: &str, snapshot: &ClassroomSnapshot) -> usize;
    fn disconnect(&self, classroom_id: &str, connection_id: Uuid) -> bool;
    fn connection_count(&self, classroom_id: &str) -> usize;
    fn total_connections(&self) -> usize;
}

/// In-process fan-out. Every connection owns a bounded queue; a connection
/// whose queue is closed or full is dropped from its classroom set on the
/// next broadcast.
pub struct BroadcastHub {
    store: Arc<dyn SnapshotStore>,
    queue_capacity: usize,
    connections: RwLock<HashMap<String, HashMap<Uuid, mpsc::Sender<String>>>>,
}

impl BroadcastHub {
    pub fn new(store: Arc<dyn SnapshotStore>, queue_capacity: usize) -> Self {
        Self {
            store,
            queue_capacity: queue_capacity.max(1),
            connections: RwLock::new(HashMap::new()),
        }
    }
}

impl SnapshotFanout for BroadcastHub {
    fn connect(&self, classroom_id: &str) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.queue_capacity);
        let connection_id = Uuid::new_v4();

        // Hold the write lock while seeding so no broadcast can overtake the
        // current snapshot.
        let mut connections = self.connections.write();
        if let Some(latest) = self.store.get_latest(classroom_id) {
            let _ = sender.try_send(HubFrame::Current { data: &latest }.to_text());
        }
        let set = connections.entry(classroom_id.to_string()).or_default();
        set.insert(connection_id, sender);

        debug!(
            classroom_id = %classroom_id,
            connection_id = %connection_id,
            connections = set.len(),
            "subscriber connected"
        );

        Subscription {
            connection_id,
            classroom_id: classroom_id.to_string(),
            receiver,
        }
    }

    fn broadcast(&self, classroom_id: &str, snapshot: &ClassroomSnapshot) -> usize {
        let mut connections = self.connections.write();
        let Some(set) = connections.get_mut(classroom_id) else {
            return 0;
        };

        let text = HubFrame::Snapshot { data: snapshot }.to_text();
        let mut failed = Vec::new();
        for (connection_id, sender) in set.iter() {
            if let Err(err) = sender.try_send(text.clone()) {
                warn!(
                    classroom_id = %classroom_id,
                    connection_id = %connection_id,
                    error = %err,
                    "snapshot delivery failed, dropping subscriber"
                );
                failed.push(*connection_id);
            }
        }

        for connection_id in &failed {
            set.remove(connection_id);
        }
        let delivered = set.len();
        if set.is_empty() {
            connections.remove(classroom_id);
        }

        debug!(
            classroom_id = %classroom_id,
            delivered,
            dropped = failed.len(),
            "snapshot broadcast"
        );
        delivered
    }

    fn disconnect(&self, classroom_id: &str, connection_id: Uuid) -> bool {
        let mut connections = self.connections.write();
        let Some(set) = connections.get_mut(classroom_id) else {
            return false;
        };
        let removed = set.remove(&connection_id).is_some();
        if set.is_empty() {
            connections.remove(classroom_id);
        }
        if removed {
            debug!(classroom_id = %classroom_id, connection_id = %connection_id, "subscriber disconnected");
        }
        removed
    }

    fn connection_count(&self, classroom_id: &str) -> usize {
        self.connections
            .read()
            .get(classroom_id)
            .map(HashMap::len)
            .unwrap_or(0)
    }

    fn total_connections(&self) -> usize {
        self.connections.read().values().map(HashMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::MemoryStore;

    fn snapshot(classroom_id: &str, marker: f64) -> ClassroomSnapshot {
        ClassroomSnapshot {
            classroom_id: classroom_id.to_string(),
            analysis_timestamp: "2026-10-16T09:00:00+00:00".to_string(),
            overall_attention: marker,
            student_statuses: Vec::new(),
            teaching_recommendations: Vec::new(),
            alert_flags: Vec::new(),
        }
    }

    fn hub_with(store: Arc<MemoryStore>, capacity: usize) -> BroadcastHub {
        BroadcastHub::new(store, capacity)
    }

    fn frame_type(text: &str) -> String {
        let value: serde_json::Value = serde_json::from_str(text).unwrap();
        value["type"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_broadcast_without_connections_is_noop() {
        let hub = hub_with(Arc::new(MemoryStore::default()), 4);
        assert_eq!(hub.broadcast("empty", &snapshot("empty", 1.0)), 0);
        assert_eq!(hub.total_connections(), 0);
    }

    #[tokio::test]
    async fn test_connect_pushes_current_snapshot_first() {
        let store = Arc::new(MemoryStore::default());
        store.set_latest("r1", snapshot("r1", 42.0));
        let hub = hub_with(store, 4);

        let mut sub = hub.connect("r1");
        hub.broadcast("r1", &snapshot("r1", 43.0));

        let first = sub.receiver.recv().await.unwrap();
        assert_eq!(frame_type(&first), "current");
        let second = sub.receiver.recv().await.unwrap();
        assert_eq!(frame_type(&second), "snapshot");
        let value: serde_json::Value = serde_json::from_str(&second).unwrap();
        assert_eq!(value["data"]["overall_attention"], 43.0);
    }

    #[tokio::test]
    async fn test_failed_subscriber_is_removed_and_others_still_receive() {
        let hub = hub_with(Arc::new(MemoryStore::default()), 4);
        let mut healthy = hub.connect("r1");
        let closed = hub.connect("r1");
        drop(closed.receiver);

        assert_eq!(hub.connection_count("r1"), 2);
        assert_eq!(hub.broadcast("r1", &snapshot("r1", 1.0)), 1);
        assert_eq!(hub.connection_count("r1"), 1);
        assert!(healthy.receiver.recv().await.is_some());

        // the removed connection never comes back
        assert!(!hub.disconnect("r1", closed.connection_id));
    }

    #[test]
    fn test_full_queue_counts_as_send_failure() {
        let hub = hub_with(Arc::new(MemoryStore::default()), 1);
        let _slow = hub.connect("r1");
        assert_eq!(hub.broadcast("r1", &snapshot("r1", 1.0)), 1);
        assert_eq!(hub.broadcast("r1", &snapshot("r1", 2.0)), 0);
        assert_eq!(hub.connection_count("r1"), 0);
        assert_eq!(hub.total_connections(), 0);
    }

    #[test]
    fn test_classrooms_are_isolated() {
        let hub = hub_with(Arc::new(MemoryStore::default()), 4);
        let a = hub.connect("a");
        let _b = hub.connect("b");
        assert_eq!(hub.broadcast("a", &snapshot("a", 1.0)), 1);
        assert!(hub.disconnect("a", a.connection_id));
        assert_eq!(hub.connection_count("a"), 0);
        assert_eq!(hub.connection_count("b"), 1);
        assert_eq!(hub.total_connections(), 1);
    }

    #[test]
    fn test_frame_wire_format() {
        assert_eq!(HubFrame::Pong.to_text(), r#"{"type":"pong"}"#);
        assert_eq!(frame_type(&HubFrame::heartbeat().to_text()), "heartbeat");
    }
}
