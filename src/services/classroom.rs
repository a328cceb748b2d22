use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::analysis::attention::{attention_level, AttentionLevel};
use crate::analysis::behavior::is_attentive;
use crate::analysis::fatigue::FatigueDiagnostics;
use crate::analysis::{
    AnalysisConfig, AnalysisError, AnalysisPipeline, AnalysisRequest, ClassroomSnapshot,
    ClassroomSummary, FatigueClassifier, HistoryEntry,
};
use crate::services::hub::SnapshotFanout;
use crate::services::store::SnapshotStore;

type Roster = Arc<Mutex<FatigueClassifier>>;

enum CommitJob {
    Snapshot(ClassroomSnapshot),
    Flush(oneshot::Sender<()>),
}

#[derive(Debug, Clone, Serialize)]
pub struct AttentionDiagnostics {
    pub student_id: String,
    pub attention_level: AttentionLevel,
    pub attentive: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassroomDiagnostics {
    pub classroom_id: String,
    pub tracked_students: usize,
    pub fatigue: Vec<FatigueDiagnostics>,
    /// Derived from the latest stored snapshot.
    pub attention: Vec<AttentionDiagnostics>,
}

/// Entry point for ingest and queries. Owns one fatigue roster per classroom
/// and hands finished snapshots to a single commit worker, which applies them
/// to the store and the hub in the order they were produced.
pub struct ClassroomService {
    pipeline: AnalysisPipeline,
    rosters: Mutex<HashMap<String, Roster>>,
    store: Arc<dyn SnapshotStore>,
    commits: mpsc::UnboundedSender<CommitJob>,
}

impl ClassroomService {
    /// Spawns the commit worker; must be called from within a tokio runtime.
    pub fn new(
        config: AnalysisConfig,
        store: Arc<dyn SnapshotStore>,
        hub: Arc<dyn SnapshotFanout>,
    ) -> Self {
        let (commits, jobs) = mpsc::unbounded_channel();
        tokio::spawn(run_commits(Arc::clone(&store), hub, jobs));

        Self {
            pipeline: AnalysisPipeline::new(config),
            rosters: Mutex::new(HashMap::new()),
            store,
            commits,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.pipeline.config()
    }

    fn roster(&self, classroom_id: &str) -> Roster {
        let mut rosters = self.rosters.lock();
        rosters
            .entry(classroom_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(FatigueClassifier::new(
                    self.pipeline.config().fatigue.clone(),
                )))
            })
            .clone()
    }

    fn existing_roster(&self, classroom_id: &str) -> Option<Roster> {
        self.rosters.lock().get(classroom_id).cloned()
    }

    /// Runs one cycle and returns its snapshot. Storage and fan-out happen on
    /// the commit worker; call [`flush`](Self::flush) to wait for them.
    pub fn analyze(&self, request: AnalysisRequest) -> Result<ClassroomSnapshot, AnalysisError> {
        self.pipeline.validate(&request)?;

        let classroom_id = request.classroom_id.as_str();
        let roster = self.roster(classroom_id);
        let (snapshot, tracked) = {
            let mut classifier = roster.lock();
            let analysis_timestamp = chrono::Utc::now().to_rfc3339();
            let snapshot = self
                .pipeline
                .run_cycle(&request, &mut classifier, analysis_timestamp)
                .inspect_err(|err| {
                    error!(classroom_id = %classroom_id, error = %err, "analysis cycle aborted");
                })?;

            let present: HashSet<&str> = request
                .students
                .iter()
                .map(|s| s.student_id.as_str())
                .collect();
            let evicted = classifier.retain_roster(&present);

            debug!(
                classroom_id = %classroom_id,
                students = snapshot.student_statuses.len(),
                evicted = evicted.len(),
                overall_attention = snapshot.overall_attention,
                "analysis cycle complete"
            );

            // Enqueued under the roster lock so commits follow cycle order.
            if self.commits.send(CommitJob::Snapshot(snapshot.clone())).is_err() {
                error!(classroom_id = %classroom_id, "commit worker stopped, snapshot not stored");
            }
            (snapshot, classifier.tracked_students())
        };

        if tracked == 0 {
            self.release_idle_roster(classroom_id, &roster);
        }
        Ok(snapshot)
    }

    /// Forgets a roster with no windows, unless another request holds it.
    fn release_idle_roster(&self, classroom_id: &str, roster: &Roster) {
        let mut rosters = self.rosters.lock();
        let ours = rosters
            .get(classroom_id)
            .is_some_and(|current| Arc::ptr_eq(current, roster));
        if ours && Arc::strong_count(roster) == 2 && roster.lock().tracked_students() == 0 {
            rosters.remove(classroom_id);
            debug!(classroom_id = %classroom_id, "empty fatigue roster released");
        }
    }

    /// Resolves once every snapshot produced before the call has been stored
    /// and broadcast.
    pub async fn flush(&self) {
        let (done, finished) = oneshot::channel();
        if self.commits.send(CommitJob::Flush(done)).is_ok() {
            let _ = finished.await;
        }
    }

    /// Drops every fatigue window for the classroom. Returns how many were
    /// evicted; an unknown classroom evicts nothing.
    pub fn end_session(&self, classroom_id: &str) -> usize {
        let Some(roster) = self.rosters.lock().remove(classroom_id) else {
            return 0;
        };
        let evicted = roster.lock().clear();
        info!(classroom_id = %classroom_id, evicted, "classroom session ended");
        evicted
    }

    pub fn evict_student(&self, classroom_id: &str, student_id: &str) -> bool {
        let Some(roster) = self.existing_roster(classroom_id) else {
            return false;
        };
        let (removed, tracked) = {
            let mut classifier = roster.lock();
            (classifier.evict(student_id), classifier.tracked_students())
        };
        if removed {
            info!(classroom_id = %classroom_id, student_id = %student_id, "student removed from roster");
        }
        if tracked == 0 {
            self.release_idle_roster(classroom_id, &roster);
        }
        removed
    }

    pub fn diagnostics(&self, classroom_id: &str) -> Option<ClassroomDiagnostics> {
        let roster = self.existing_roster(classroom_id);
        let latest = self.store.get_latest(classroom_id);
        if roster.is_none() && latest.is_none() {
            return None;
        }

        let (tracked_students, fatigue) = roster
            .map(|roster| {
                let classifier = roster.lock();
                (classifier.tracked_students(), classifier.diagnostics())
            })
            .unwrap_or_default();
        let attention = latest
            .map(|snapshot| {
                snapshot
                    .student_statuses
                    .iter()
                    .map(|status| AttentionDiagnostics {
                        student_id: status.student_id.clone(),
                        attention_level: attention_level(status.attention_score),
                        attentive: is_attentive(&status.behavior_tags),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(ClassroomDiagnostics {
            classroom_id: classroom_id.to_string(),
            tracked_students,
            fatigue,
            attention,
        })
    }

    pub fn latest(&self, classroom_id: &str) -> Option<ClassroomSnapshot> {
        self.store.get_latest(classroom_id)
    }

    /// Most recent `limit` entries plus the total number stored.
    pub fn history(&self, classroom_id: &str, limit: usize) -> (Vec<HistoryEntry>, usize) {
        (
            self.store.get_history(classroom_id, limit),
            self.store.history_len(classroom_id),
        )
    }

    pub fn classrooms(&self) -> Vec<ClassroomSummary> {
        self.store.list_classrooms()
    }
}

async fn run_commits(
    store: Arc<dyn SnapshotStore>,
    hub: Arc<dyn SnapshotFanout>,
    mut jobs: mpsc::UnboundedReceiver<CommitJob>,
) {
    while let Some(job) = jobs.recv().await {
        match job {
            CommitJob::Snapshot(snapshot) => commit(store.as_ref(), hub.as_ref(), snapshot),
            CommitJob::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("commit worker stopped");
}

fn commit(store: &dyn SnapshotStore, hub: &dyn SnapshotFanout, snapshot: ClassroomSnapshot) {
    let classroom_id = snapshot.classroom_id.clone();
    store.set_latest(&classroom_id, snapshot.clone());
    let delivered = hub.broadcast(&classroom_id, &snapshot);
    store.add_history(&classroom_id, snapshot);
    debug!(classroom_id = %classroom_id, delivered, "snapshot committed");
}
