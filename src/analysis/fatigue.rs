use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;
use tracing::debug;

use super::config::FatigueParams;
use super::types::FatigueLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EyeState {
    Open,
    Closing,
    Closed,
}

const EYE_CLOSING_THRESHOLD: f64 = 0.25;

pub fn eye_state(ear: f64, params: &FatigueParams) -> EyeState {
    if ear < params.ear_closed_threshold {
        EyeState::Closed
    } else if ear < EYE_CLOSING_THRESHOLD {
        EyeState::Closing
    } else {
        EyeState::Open
    }
}

/// Fixed-capacity EAR/MAR rings for one student.
#[derive(Debug, Clone)]
struct FatigueWindow {
    ear: VecDeque<f64>,
    mar: VecDeque<f64>,
    ear_capacity: usize,
    mar_capacity: usize,
    last_seen_cycle: u64,
}

impl FatigueWindow {
    fn new(ear_capacity: usize, mar_capacity: usize) -> Self {
        Self {
            ear: VecDeque::with_capacity(ear_capacity),
            mar: VecDeque::with_capacity(mar_capacity),
            ear_capacity: ear_capacity.max(1),
            mar_capacity: mar_capacity.max(1),
            last_seen_cycle: 0,
        }
    }

    fn push(&mut self, ear: f64, mar: f64) {
        if self.ear.len() == self.ear_capacity {
            self.ear.pop_front();
        }
        self.ear.push_back(ear);

        if self.mar.len() == self.mar_capacity {
            self.mar.pop_front();
        }
        self.mar.push_back(mar);
    }

    fn len(&self) -> usize {
        self.ear.len()
    }

    fn last_ear(&self) -> Option<f64> {
        self.ear.back().copied()
    }

    fn perclos(&self, closed_threshold: f64) -> f64 {
        if self.ear.is_empty() {
            return 0.0;
        }
        let closed = self.ear.iter().filter(|&&ear| ear < closed_threshold).count();
        closed as f64 / self.ear.len() as f64
    }

    fn mean_mar(&self) -> f64 {
        if self.mar.is_empty() {
            return 0.0;
        }
        self.mar.iter().sum::<f64>() / self.mar.len() as f64
    }
}

/// Window state of one tracked student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FatigueDiagnostics {
    pub student_id: String,
    pub samples: usize,
    pub perclos: f64,
    pub mean_mar: f64,
    pub eye_state: Option<EyeState>,
    pub last_seen_cycle: u64,
}

/// Saved windows and cycle counter, taken before a cycle mutates anything.
#[derive(Debug)]
pub struct Checkpoint {
    cycle: u64,
    windows: Vec<(String, Option<FatigueWindow>)>,
}

/// Sliding-window PERCLOS classifier for one classroom roster.
///
/// Windows are keyed by student id and survive across cycles. A window is
/// evicted when its student has been missing from more than
/// `roster_grace_cycles` consecutive cycles, or explicitly via [`evict`] and
/// [`clear`].
///
/// [`evict`]: FatigueClassifier::evict
/// [`clear`]: FatigueClassifier::clear
pub struct FatigueClassifier {
    params: FatigueParams,
    windows: HashMap<String, FatigueWindow>,
    cycle: u64,
}

impl FatigueClassifier {
    pub fn new(params: FatigueParams) -> Self {
        Self {
            params,
            windows: HashMap::new(),
            cycle: 0,
        }
    }

    pub fn begin_cycle(&mut self) -> u64 {
        self.cycle += 1;
        self.cycle
    }

    pub fn classify(&mut self, student_id: &str, ear: f64, mar: f64) -> FatigueLevel {
        let cycle = self.cycle;
        let params = &self.params;
        let window = self
            .windows
            .entry(student_id.to_string())
            .or_insert_with(|| FatigueWindow::new(params.ear_window, params.mar_window));
        window.push(ear, mar);
        window.last_seen_cycle = cycle;

        if window.len() < params.min_samples {
            return FatigueLevel::Alert;
        }

        let perclos = window.perclos(params.ear_closed_threshold);
        let is_yawning = window.mean_mar() > params.mar_yawn_threshold;

        if perclos > params.perclos_drowsy {
            FatigueLevel::Drowsy
        } else if perclos > params.perclos_tired || is_yawning {
            FatigueLevel::Tired
        } else {
            FatigueLevel::Alert
        }
    }

    pub fn checkpoint<'a>(&self, student_ids: impl IntoIterator<Item = &'a str>) -> Checkpoint {
        Checkpoint {
            cycle: self.cycle,
            windows: student_ids
                .into_iter()
                .map(|id| (id.to_string(), self.windows.get(id).cloned()))
                .collect(),
        }
    }

    /// Rolls the touched windows and the cycle counter back to `checkpoint`.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.cycle = checkpoint.cycle;
        for (id, window) in checkpoint.windows {
            match window {
                Some(window) => {
                    self.windows.insert(id, window);
                }
                None => {
                    self.windows.remove(&id);
                }
            }
        }
        debug!(cycle = self.cycle, "fatigue windows restored from checkpoint");
    }

    /// Evicts students absent from the current roster for longer than the
    /// grace period. Returns the evicted ids, sorted.
    pub fn retain_roster(&mut self, present: &HashSet<&str>) -> Vec<String> {
        let cycle = self.cycle;
        let grace = self.params.roster_grace_cycles;
        let mut evicted: Vec<String> = self
            .windows
            .iter()
            .filter(|(id, window)| {
                !present.contains(id.as_str()) && cycle.saturating_sub(window.last_seen_cycle) > grace
            })
            .map(|(id, _)| id.clone())
            .collect();
        evicted.sort();

        for id in &evicted {
            self.windows.remove(id);
            debug!(student_id = %id, cycle, "fatigue window evicted after leaving roster");
        }
        evicted
    }

    pub fn evict(&mut self, student_id: &str) -> bool {
        let removed = self.windows.remove(student_id).is_some();
        if removed {
            debug!(student_id = %student_id, "fatigue window evicted");
        }
        removed
    }

    pub fn clear(&mut self) -> usize {
        let count = self.windows.len();
        self.windows.clear();
        self.cycle = 0;
        debug!(evicted = count, "fatigue roster cleared");
        count
    }

    pub fn diagnostics(&self) -> Vec<FatigueDiagnostics> {
        let mut out: Vec<FatigueDiagnostics> = self
            .windows
            .iter()
            .map(|(student_id, window)| FatigueDiagnostics {
                student_id: student_id.clone(),
                samples: window.len(),
                perclos: window.perclos(self.params.ear_closed_threshold),
                mean_mar: window.mean_mar(),
                eye_state: window.last_ear().map(|ear| eye_state(ear, &self.params)),
                last_seen_cycle: window.last_seen_cycle,
            })
            .collect();
        out.sort_by(|a, b| a.student_id.cmp(&b.student_id));
        out
    }

    pub fn tracked_students(&self) -> usize {
        self.windows.len()
    }
}

impl Default for FatigueClassifier {
    fn default() -> Self {
        Self::new(FatigueParams::default())
    }
}
