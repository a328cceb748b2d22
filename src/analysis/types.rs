use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub yaw: f64,
    #[serde(default)]
    pub roll: f64,
}

impl HeadPose {
    pub fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    pub fn is_finite(&self) -> bool {
        self.pitch.is_finite() && self.yaw.is_finite() && self.roll.is_finite()
    }
}

/// One upstream feature record for a single student in a single frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentFrameFeature {
    pub student_id: String,
    #[serde(default)]
    pub face_bbox: Vec<i64>,
    #[serde(default)]
    pub landmarks: Vec<Vec<f64>>,
    #[serde(default)]
    pub head_pose: HeadPose,
    pub eye_aspect_ratio: f64,
    pub mouth_aspect_ratio: f64,
    #[serde(default)]
    pub local_timestamp: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub classroom_id: String,
    pub course_id: String,
    pub timestamp: String,
    #[serde(default)]
    pub student_count: Option<usize>,
    pub students: Vec<StudentFrameFeature>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FatigueLevel {
    Alert,
    Tired,
    Drowsy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorTag {
    LookingFront,
    LookingDown,
    TurningAround,
    LookingLeft,
    LookingRight,
    EyesClosed,
    HeadDropping,
    RubbingEyes,
    HeadDown,
}

impl BehaviorTag {
    pub const ALL: [BehaviorTag; 9] = [
        Self::LookingFront,
        Self::LookingDown,
        Self::TurningAround,
        Self::LookingLeft,
        Self::LookingRight,
        Self::EyesClosed,
        Self::HeadDropping,
        Self::RubbingEyes,
        Self::HeadDown,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentStatus {
    pub student_id: String,
    pub attention_score: f64,
    pub fatigue_level: FatigueLevel,
    pub behavior_tags: Vec<BehaviorTag>,
    pub engagement_index: f64,
    pub suggestions: Vec<String>,
}

impl StudentStatus {
    pub fn has_tag(&self, tag: BehaviorTag) -> bool {
        self.behavior_tags.contains(&tag)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassroomSnapshot {
    pub classroom_id: String,
    pub analysis_timestamp: String,
    pub overall_attention: f64,
    pub student_statuses: Vec<StudentStatus>,
    pub teaching_recommendations: Vec<String>,
    pub alert_flags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub data: ClassroomSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassroomSummary {
    pub classroom_id: String,
    pub last_update: String,
    pub student_count: usize,
}

/// Per-cycle counters used by classroom-level rules.
#[derive(Debug, Clone, Default)]
pub struct ClassroomStats {
    pub student_count: usize,
    pub mean_attention: f64,
    pub drowsy_ratio: f64,
    pub low_engagement_ratio: f64,
    pub critical_count: usize,
    pub sleeping_count: usize,
    pub fatigue_counts: HashMap<FatigueLevel, usize>,
}
