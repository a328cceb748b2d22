use serde::Serialize;

use super::config::AttentionParams;
use super::types::HeadPose;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionLevel {
    Focused,
    Attentive,
    Distracted,
    SeverelyDistracted,
}

pub fn attention_level(score: f64) -> AttentionLevel {
    if score >= 80.0 {
        AttentionLevel::Focused
    } else if score >= 60.0 {
        AttentionLevel::Attentive
    } else if score >= 40.0 {
        AttentionLevel::Distracted
    } else {
        AttentionLevel::SeverelyDistracted
    }
}

/// Stateless head-pose and landmark attention scorer.
#[derive(Debug, Clone, Default)]
pub struct AttentionScorer {
    params: AttentionParams,
}

impl AttentionScorer {
    pub fn new(params: AttentionParams) -> Self {
        Self { params }
    }

    pub fn score(&self, landmarks: &[Vec<f64>], head_pose: &HeadPose) -> f64 {
        let p = &self.params;
        let mut score = 100.0;
        let yaw = head_pose.yaw.abs();
        let pitch = head_pose.pitch;

        if yaw > p.yaw_threshold {
            score -= ((yaw - p.yaw_threshold) * p.yaw_penalty_per_degree).min(p.yaw_penalty_cap);
        }

        if pitch > p.pitch_down_threshold {
            score -= p.pitch_down_penalty;
        } else if pitch < p.pitch_up_threshold {
            score -= p.pitch_up_penalty;
        }

        if let Some(offset) = self.nose_offset(landmarks) {
            if offset > p.nose_offset_threshold {
                score -= p.nose_offset_penalty;
            }
        }

        f64::clamp(score, 0.0, 100.0)
    }

    /// Horizontal distance between the nose tip and the mean of the leading
    /// mesh points. Only defined when the full mesh is present.
    fn nose_offset(&self, landmarks: &[Vec<f64>]) -> Option<f64> {
        let p = &self.params;
        if landmarks.len() <= p.full_mesh_points {
            return None;
        }

        let head = &landmarks[..p.face_center_points.min(landmarks.len())];
        let xs: Vec<f64> = head.iter().filter_map(|point| point.first().copied()).collect();
        if xs.is_empty() {
            return None;
        }
        let center_x = xs.iter().sum::<f64>() / xs.len() as f64;
        let nose_x = landmarks.get(p.nose_tip_index)?.first().copied()?;

        Some((nose_x - center_x).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> AttentionScorer {
        AttentionScorer::default()
    }

    fn mesh(center_x: f64, nose_x: f64) -> Vec<Vec<f64>> {
        let mut points = vec![vec![center_x, 0.5, 0.0]; 478];
        points[1] = vec![nose_x, 0.5, 0.0];
        points
    }

    #[test]
    fn test_neutral_pose_scores_full() {
        assert_eq!(scorer().score(&[], &HeadPose::default()), 100.0);
    }

    #[test]
    fn test_yaw_penalty_is_capped() {
        let s = scorer();
        assert_eq!(s.score(&[], &HeadPose::new(0.0, 50.0, 0.0)), 60.0);
        assert_eq!(s.score(&[], &HeadPose::new(0.0, -25.0, 0.0)), 85.0);
        assert_eq!(s.score(&[], &HeadPose::new(0.0, 90.0, 0.0)), 60.0);
    }

    #[test]
    fn test_pitch_penalties() {
        let s = scorer();
        assert_eq!(s.score(&[], &HeadPose::new(30.0, 0.0, 0.0)), 75.0);
        assert_eq!(s.score(&[], &HeadPose::new(-20.0, 0.0, 0.0)), 85.0);
        assert_eq!(s.score(&[], &HeadPose::new(20.0, 0.0, 0.0)), 100.0);
    }

    #[test]
    fn test_nose_offset_needs_full_mesh() {
        let s = scorer();
        let mut sparse = mesh(0.5, 0.9);
        sparse.truncate(468);
        assert_eq!(s.score(&sparse, &HeadPose::default()), 100.0);
        assert_eq!(s.score(&mesh(0.5, 0.9), &HeadPose::default()), 85.0);
        assert_eq!(s.score(&mesh(0.5, 0.52), &HeadPose::default()), 100.0);
    }

    #[test]
    fn test_score_is_pure_and_clipped() {
        let s = scorer();
        let pose = HeadPose::new(45.0, 80.0, 3.0);
        let landmarks = mesh(0.2, 0.9);
        let first = s.score(&landmarks, &pose);
        assert_eq!(first, s.score(&landmarks, &pose));
        assert!((0.0..=100.0).contains(&first));
        assert_eq!(first, 100.0 - 40.0 - 25.0 - 15.0);
    }

    #[test]
    fn test_attention_level() {
        assert_eq!(attention_level(95.0), AttentionLevel::Focused);
        assert_eq!(attention_level(60.0), AttentionLevel::Attentive);
        assert_eq!(attention_level(45.0), AttentionLevel::Distracted);
        assert_eq!(attention_level(10.0), AttentionLevel::SeverelyDistracted);
    }
}
