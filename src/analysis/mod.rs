pub mod attention;
pub mod behavior;
pub mod classroom;
pub mod config;
pub mod engagement;
pub mod fatigue;
pub mod pipeline;
pub mod types;

pub use config::AnalysisConfig;
pub use fatigue::FatigueClassifier;
pub use pipeline::{AnalysisError, AnalysisPipeline};
pub use types::{
    AnalysisRequest, ClassroomSnapshot, ClassroomSummary, FatigueLevel, HeadPose, HistoryEntry,
    StudentFrameFeature,
};
