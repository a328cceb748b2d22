use std::collections::HashSet;

use thiserror::Error;

use super::attention::AttentionScorer;
use super::behavior::BehaviorTagger;
use super::classroom;
use super::config::AnalysisConfig;
use super::engagement;
use super::fatigue::FatigueClassifier;
use super::types::{AnalysisRequest, ClassroomSnapshot, StudentFrameFeature, StudentStatus};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid batch: {0}")]
    Validation(String),
    #[error("analysis failed: {0}")]
    Internal(String),
}

/// Runs one analysis cycle for one classroom.
#[derive(Debug, Clone, Default)]
pub struct AnalysisPipeline {
    config: AnalysisConfig,
    attention: AttentionScorer,
    behavior: BehaviorTagger,
}

impl AnalysisPipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            attention: AttentionScorer::new(config.attention.clone()),
            behavior: BehaviorTagger::new(config.behavior.clone()),
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn validate(&self, request: &AnalysisRequest) -> Result<(), AnalysisError> {
        if request.classroom_id.trim().is_empty() {
            return Err(AnalysisError::Validation("classroom_id must not be empty".into()));
        }
        if let Some(expected) = request.student_count {
            if expected != request.students.len() {
                return Err(AnalysisError::Validation(format!(
                    "student_count {expected} does not match {} student records",
                    request.students.len()
                )));
            }
        }

        let mut seen = HashSet::with_capacity(request.students.len());
        for (index, student) in request.students.iter().enumerate() {
            validate_student(index, student)?;
            if !seen.insert(student.student_id.as_str()) {
                return Err(AnalysisError::Validation(format!(
                    "duplicate student_id {} in batch",
                    student.student_id
                )));
            }
        }
        Ok(())
    }

    /// Advances the classifier by one cycle, classifies every student in input
    /// order and aggregates the classroom. The caller owns the classifier lock
    /// and must call `validate` first. On error the classifier is rolled back.
    pub fn run_cycle(
        &self,
        request: &AnalysisRequest,
        classifier: &mut FatigueClassifier,
        analysis_timestamp: String,
    ) -> Result<ClassroomSnapshot, AnalysisError> {
        let checkpoint = classifier.checkpoint(request.students.iter().map(|s| s.student_id.as_str()));
        classifier.begin_cycle();

        match self.classify_students(request, classifier) {
            Ok(statuses) => {
                let params = &self.config.classroom;
                Ok(ClassroomSnapshot {
                    classroom_id: request.classroom_id.clone(),
                    analysis_timestamp,
                    overall_attention: classroom::overall_attention(&statuses),
                    teaching_recommendations: classroom::teaching_recommendations(
                        &statuses,
                        &request.course_id,
                        params,
                    ),
                    alert_flags: classroom::alert_flags(&statuses, params),
                    student_statuses: statuses,
                })
            }
            Err(err) => {
                classifier.restore(checkpoint);
                Err(err)
            }
        }
    }

    fn classify_students(
        &self,
        request: &AnalysisRequest,
        classifier: &mut FatigueClassifier,
    ) -> Result<Vec<StudentStatus>, AnalysisError> {
        let mut statuses = Vec::with_capacity(request.students.len());

        for student in &request.students {
            let attention = self.attention.score(&student.landmarks, &student.head_pose);
            if !attention.is_finite() {
                return Err(non_finite(&student.student_id));
            }
            let fatigue = classifier.classify(
                &student.student_id,
                student.eye_aspect_ratio,
                student.mouth_aspect_ratio,
            );
            let behaviors = self.behavior.tag(&student.head_pose, fatigue);
            let engagement = engagement::engagement(attention, fatigue, &behaviors);
            if !engagement.is_finite() {
                return Err(non_finite(&student.student_id));
            }
            let suggestions = engagement::suggestions(attention, fatigue, &behaviors);

            statuses.push(StudentStatus {
                student_id: student.student_id.clone(),
                attention_score: attention,
                fatigue_level: fatigue,
                behavior_tags: behaviors,
                engagement_index: engagement,
                suggestions,
            });
        }

        Ok(statuses)
    }
}

fn non_finite(student_id: &str) -> AnalysisError {
    AnalysisError::Internal(format!("non-finite score for student {student_id}"))
}

fn validate_student(index: usize, student: &StudentFrameFeature) -> Result<(), AnalysisError> {
    let invalid = |reason: &str| {
        AnalysisError::Validation(format!(
            "students[{index}] ({}): {reason}",
            student.student_id
        ))
    };

    if student.student_id.trim().is_empty() {
        return Err(invalid("student_id must not be empty"));
    }
    if !student.face_bbox.is_empty() && student.face_bbox.len() != 4 {
        return Err(invalid("face_bbox must have 4 elements"));
    }
    if !student.head_pose.is_finite() {
        return Err(invalid("head_pose must be finite"));
    }
    for (name, value) in [
        ("eye_aspect_ratio", student.eye_aspect_ratio),
        ("mouth_aspect_ratio", student.mouth_aspect_ratio),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(&format!("{name} must be a finite non-negative number")));
        }
    }
    if student
        .landmarks
        .iter()
        .any(|point| point.len() < 2 || point.iter().any(|v| !v.is_finite()))
    {
        return Err(invalid("landmarks must be finite points with at least 2 coordinates"));
    }
    Ok(())
}
