use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FatigueParams {
    pub ear_window: usize,
    pub mar_window: usize,
    pub min_samples: usize,
    pub ear_closed_threshold: f64,
    pub mar_yawn_threshold: f64,
    pub perclos_drowsy: f64,
    pub perclos_tired: f64,
    pub roster_grace_cycles: u64,
}

impl Default for FatigueParams {
    fn default() -> Self {
        Self {
            ear_window: 30,
            mar_window: 10,
            min_samples: 10,
            ear_closed_threshold: 0.2,
            mar_yawn_threshold: 0.5,
            perclos_drowsy: 0.3,
            perclos_tired: 0.15,
            roster_grace_cycles: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttentionParams {
    pub yaw_threshold: f64,
    pub yaw_penalty_per_degree: f64,
    pub yaw_penalty_cap: f64,
    pub pitch_down_threshold: f64,
    pub pitch_down_penalty: f64,
    pub pitch_up_threshold: f64,
    pub pitch_up_penalty: f64,
    /// Landmark count above which the full face mesh is assumed present.
    pub full_mesh_points: usize,
    pub face_center_points: usize,
    pub nose_tip_index: usize,
    pub nose_offset_threshold: f64,
    pub nose_offset_penalty: f64,
}

impl Default for AttentionParams {
    fn default() -> Self {
        Self {
            yaw_threshold: 15.0,
            yaw_penalty_per_degree: 1.5,
            yaw_penalty_cap: 40.0,
            pitch_down_threshold: 20.0,
            pitch_down_penalty: 25.0,
            pitch_up_threshold: -15.0,
            pitch_up_penalty: 15.0,
            full_mesh_points: 468,
            face_center_points: 100,
            nose_tip_index: 1,
            nose_offset_threshold: 0.08,
            nose_offset_penalty: 15.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorParams {
    pub yaw_front: f64,
    pub pitch_front: f64,
    pub pitch_down: f64,
    pub yaw_turning: f64,
    pub yaw_side: f64,
    pub pitch_sleep: f64,
    pub pitch_head_down: f64,
}

impl Default for BehaviorParams {
    fn default() -> Self {
        Self {
            yaw_front: 15.0,
            pitch_front: 20.0,
            pitch_down: 25.0,
            yaw_turning: 45.0,
            yaw_side: 20.0,
            pitch_sleep: 35.0,
            pitch_head_down: 40.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassroomParams {
    pub attention_critical: f64,
    pub attention_warning: f64,
    pub drowsy_ratio_break: f64,
    pub drowsy_ratio_pace: f64,
    pub low_engagement_threshold: f64,
    pub low_engagement_ratio: f64,
    pub abstract_course_keyword: String,
    pub abstract_course_attention: f64,
    pub critical_engagement: f64,
    pub sleeping_alert_count: usize,
}

impl Default for ClassroomParams {
    fn default() -> Self {
        Self {
            attention_critical: 50.0,
            attention_warning: 70.0,
            drowsy_ratio_break: 0.3,
            drowsy_ratio_pace: 0.1,
            low_engagement_threshold: 40.0,
            low_engagement_ratio: 0.5,
            abstract_course_keyword: "math".to_string(),
            abstract_course_attention: 65.0,
            critical_engagement: 20.0,
            sleeping_alert_count: 2,
        }
    }
}

/// The canonical threshold set used by every classifier in a cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub fatigue: FatigueParams,
    pub attention: AttentionParams,
    pub behavior: BehaviorParams,
    pub classroom: ClassroomParams,
}

impl AnalysisConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(val) = env_f64("FATIGUE_EAR_CLOSED_THRESHOLD") {
            config.fatigue.ear_closed_threshold = val;
        }
        if let Some(val) = env_f64("FATIGUE_MAR_YAWN_THRESHOLD") {
            config.fatigue.mar_yawn_threshold = val;
        }
        if let Some(val) = env_f64("FATIGUE_PERCLOS_DROWSY") {
            config.fatigue.perclos_drowsy = val;
        }
        if let Some(val) = env_f64("FATIGUE_PERCLOS_TIRED") {
            config.fatigue.perclos_tired = val;
        }
        if let Ok(val) = std::env::var("ROSTER_GRACE_CYCLES") {
            config.fatigue.roster_grace_cycles = val.parse().unwrap_or(3);
        }

        config
    }
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds_are_canonical() {
        let config = AnalysisConfig::default();
        assert_eq!(config.fatigue.ear_window, 30);
        assert_eq!(config.fatigue.mar_window, 10);
        assert_eq!(config.fatigue.min_samples, 10);
        assert_eq!(config.fatigue.perclos_drowsy, 0.3);
        assert_eq!(config.fatigue.perclos_tired, 0.15);
        assert_eq!(config.attention.full_mesh_points, 468);
    }
}
