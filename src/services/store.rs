use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::analysis::types::{ClassroomSnapshot, ClassroomSummary, HistoryEntry};

pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Storage port for classroom snapshots. The in-process [`MemoryStore`] is the
/// only implementation; an external store can be swapped in behind this trait.
pub trait SnapshotStore: Send + Sync {
    fn set_latest(&self, classroom_id: &str, snapshot: ClassroomSnapshot);
    fn get_latest(&self, classroom_id: &str) -> Option<ClassroomSnapshot>;
    fn add_history(&self, classroom_id: &str, snapshot: ClassroomSnapshot);
    fn get_history(&self, classroom_id: &str, limit: usize) -> Vec<HistoryEntry>;
    fn history_len(&self, classroom_id: &str) -> usize;
    fn list_classrooms(&self) -> Vec<ClassroomSummary>;
}

struct LatestSlot {
    snapshot: ClassroomSnapshot,
    updated_at: DateTime<Utc>,
}

pub struct MemoryStore {
    max_history: usize,
    latest: RwLock<HashMap<String, LatestSlot>>,
    history: RwLock<HashMap<String, VecDeque<HistoryEntry>>>,
}

impl MemoryStore {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history: max_history.max(1),
            latest: RwLock::new(HashMap::new()),
            history: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl SnapshotStore for MemoryStore {
    fn set_latest(&self, classroom_id: &str, snapshot: ClassroomSnapshot) {
        self.latest.write().insert(
            classroom_id.to_string(),
            LatestSlot {
                snapshot,
                updated_at: Utc::now(),
            },
        );
    }

    fn get_latest(&self, classroom_id: &str) -> Option<ClassroomSnapshot> {
        self.latest
            .read()
            .get(classroom_id)
            .map(|slot| slot.snapshot.clone())
    }

    fn add_history(&self, classroom_id: &str, snapshot: ClassroomSnapshot) {
        let mut history = self.history.write();
        let ring = history
            .entry(classroom_id.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.max_history));
        while ring.len() >= self.max_history {
            ring.pop_front();
        }
        ring.push_back(HistoryEntry {
            timestamp: Utc::now().to_rfc3339(),
            data: snapshot,
        });
    }

    fn get_history(&self, classroom_id: &str, limit: usize) -> Vec<HistoryEntry> {
        let history = self.history.read();
        let Some(ring) = history.get(classroom_id) else {
            return Vec::new();
        };
        let skip = ring.len().saturating_sub(limit);
        ring.iter().skip(skip).cloned().collect()
    }

    fn history_len(&self, classroom_id: &str) -> usize {
        self.history
            .read()
            .get(classroom_id)
            .map(VecDeque::len)
            .unwrap_or(0)
    }

    fn list_classrooms(&self) -> Vec<ClassroomSummary> {
        let mut summaries: Vec<ClassroomSummary> = self
            .latest
            .read()
            .iter()
            .map(|(classroom_id, slot)| ClassroomSummary {
                classroom_id: classroom_id.clone(),
                last_update: slot.updated_at.to_rfc3339(),
                student_count: slot.snapshot.student_statuses.len(),
            })
            .collect();
        summaries.sort_by(|a, b| a.classroom_id.cmp(&b.classroom_id));
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(classroom_id: &str, marker: f64) -> ClassroomSnapshot {
        ClassroomSnapshot {
            classroom_id: classroom_id.to_string(),
            analysis_timestamp: Utc::now().to_rfc3339(),
            overall_attention: marker,
            student_statuses: Vec::new(),
            teaching_recommendations: Vec::new(),
            alert_flags: Vec::new(),
        }
    }

    #[test]
    fn test_latest_is_overwritten() {
        let store = MemoryStore::default();
        assert!(store.get_latest("r1").is_none());
        store.set_latest("r1", snapshot("r1", 1.0));
        store.set_latest("r1", snapshot("r1", 2.0));
        assert_eq!(store.get_latest("r1").unwrap().overall_attention, 2.0);
    }

    #[test]
    fn test_history_drops_oldest_at_capacity() {
        let max = 10;
        let store = MemoryStore::new(max);
        for i in 0..(max + 5) {
            store.add_history("r1", snapshot("r1", i as f64));
        }

        let history = store.get_history("r1", max + 5);
        assert_eq!(history.len(), max);
        assert_eq!(store.history_len("r1"), max);
        let markers: Vec<f64> = history.iter().map(|e| e.data.overall_attention).collect();
        let expected: Vec<f64> = (5..(max + 5)).map(|i| i as f64).collect();
        assert_eq!(markers, expected);
    }

    #[test]
    fn test_history_limit_returns_most_recent_in_order() {
        let store = MemoryStore::default();
        for i in 0..5 {
            store.add_history("r1", snapshot("r1", i as f64));
        }
        let markers: Vec<f64> = store
            .get_history("r1", 2)
            .iter()
            .map(|e| e.data.overall_attention)
            .collect();
        assert_eq!(markers, vec![3.0, 4.0]);
        assert!(store.get_history("missing", 20).is_empty());
        assert!(store.get_history("r1", 0).is_empty());
    }

    #[test]
    fn test_list_classrooms() {
        let store = MemoryStore::default();
        store.set_latest("b", snapshot("b", 1.0));
        store.set_latest("a", snapshot("a", 1.0));

        let list = store.list_classrooms();
        let ids: Vec<&str> = list.iter().map(|s| s.classroom_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(list[0].student_count, 0);
    }
}
