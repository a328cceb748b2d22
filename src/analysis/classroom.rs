use super::config::ClassroomParams;
use super::types::{BehaviorTag, ClassroomStats, FatigueLevel, StudentStatus};

pub const WAITING_FOR_DATA: &str = "Waiting for student data...";
pub const STATUS_GOOD: &str = "Classroom is in good shape; keep going";
pub const ATTENTION_CRITICAL: &str =
    "Overall attention is low; insert an interactive segment or a short video now";
pub const ATTENTION_WARNING: &str = "Some students are drifting; ask questions more often";
pub const DROWSY_BREAK: &str = "Over 30% of students are drowsy; run a 2-3 minute break activity";
pub const DROWSY_PACE: &str = "Some students are tired; raise your voice or change the pace";
pub const LOW_ENGAGEMENT: &str =
    "Half the class is disengaged; check whether the current material is too hard";
pub const ABSTRACT_COURSE: &str = "Math content is abstract; add visual demonstrations";

pub fn classroom_stats(statuses: &[StudentStatus], params: &ClassroomParams) -> ClassroomStats {
    let mut stats = ClassroomStats {
        student_count: statuses.len(),
        ..ClassroomStats::default()
    };
    if statuses.is_empty() {
        return stats;
    }

    let n = statuses.len() as f64;
    let mut attention_sum = 0.0;
    let mut low_engagement = 0usize;

    for status in statuses {
        attention_sum += status.attention_score;
        *stats.fatigue_counts.entry(status.fatigue_level).or_insert(0) += 1;
        if status.engagement_index < params.low_engagement_threshold {
            low_engagement += 1;
        }
        if status.engagement_index < params.critical_engagement {
            stats.critical_count += 1;
        }
        if status.has_tag(BehaviorTag::HeadDropping) {
            stats.sleeping_count += 1;
        }
    }

    let drowsy = stats
        .fatigue_counts
        .get(&FatigueLevel::Drowsy)
        .copied()
        .unwrap_or(0);

    stats.mean_attention = attention_sum / n;
    stats.drowsy_ratio = drowsy as f64 / n;
    stats.low_engagement_ratio = low_engagement as f64 / n;
    stats
}

pub fn overall_attention(statuses: &[StudentStatus]) -> f64 {
    if statuses.is_empty() {
        return 0.0;
    }
    statuses.iter().map(|s| s.attention_score).sum::<f64>() / statuses.len() as f64
}

type RecommendationPredicate = fn(&ClassroomStats, &str, &ClassroomParams) -> bool;

struct RecommendationRule {
    message: &'static str,
    applies: RecommendationPredicate,
}

// Each group contributes at most one message (first match wins); groups are
// independent of each other.
const RECOMMENDATION_GROUPS: &[&[RecommendationRule]] = &[
    &[
        RecommendationRule {
            message: ATTENTION_CRITICAL,
            applies: |s, _, p| s.mean_attention < p.attention_critical,
        },
        RecommendationRule {
            message: ATTENTION_WARNING,
            applies: |s, _, p| s.mean_attention < p.attention_warning,
        },
    ],
    &[
        RecommendationRule {
            message: DROWSY_BREAK,
            applies: |s, _, p| s.drowsy_ratio > p.drowsy_ratio_break,
        },
        RecommendationRule {
            message: DROWSY_PACE,
            applies: |s, _, p| s.drowsy_ratio > p.drowsy_ratio_pace,
        },
    ],
    &[RecommendationRule {
        message: LOW_ENGAGEMENT,
        applies: |s, _, p| s.low_engagement_ratio > p.low_engagement_ratio,
    }],
    &[RecommendationRule {
        message: ABSTRACT_COURSE,
        applies: |s, course_id, p| {
            course_id
                .to_lowercase()
                .contains(&p.abstract_course_keyword.to_lowercase())
                && s.mean_attention < p.abstract_course_attention
        },
    }],
];

pub fn teaching_recommendations(
    statuses: &[StudentStatus],
    course_id: &str,
    params: &ClassroomParams,
) -> Vec<String> {
    if statuses.is_empty() {
        return vec![WAITING_FOR_DATA.to_string()];
    }

    let stats = classroom_stats(statuses, params);
    let recommendations: Vec<String> = RECOMMENDATION_GROUPS
        .iter()
        .filter_map(|group| group.iter().find(|rule| (rule.applies)(&stats, course_id, params)))
        .map(|rule| rule.message.to_string())
        .collect();

    if recommendations.is_empty() {
        vec![STATUS_GOOD.to_string()]
    } else {
        recommendations
    }
}

pub fn alert_flags(statuses: &[StudentStatus], params: &ClassroomParams) -> Vec<String> {
    let stats = classroom_stats(statuses, params);
    let mut alerts = Vec::new();

    if stats.critical_count > 0 {
        alerts.push(format!(
            "{} student(s) in critical state, need immediate attention",
            stats.critical_count
        ));
    }
    if stats.sleeping_count > params.sleeping_alert_count {
        alerts.push(format!(
            "{} student(s) may have fallen asleep",
            stats.sleeping_count
        ));
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(attention: f64, fatigue: FatigueLevel, engagement: f64, tags: Vec<BehaviorTag>) -> StudentStatus {
        StudentStatus {
            student_id: format!("s{attention}"),
            attention_score: attention,
            fatigue_level: fatigue,
            behavior_tags: tags,
            engagement_index: engagement,
            suggestions: Vec::new(),
        }
    }

    #[test]
    fn test_empty_roster() {
        let params = ClassroomParams::default();
        assert_eq!(overall_attention(&[]), 0.0);
        assert_eq!(teaching_recommendations(&[], "math", &params), vec![WAITING_FOR_DATA]);
        assert!(alert_flags(&[], &params).is_empty());
    }

    #[test]
    fn test_good_classroom() {
        let params = ClassroomParams::default();
        let statuses = vec![
            status(95.0, FatigueLevel::Alert, 100.0, vec![BehaviorTag::LookingFront]),
            status(85.0, FatigueLevel::Alert, 90.0, vec![BehaviorTag::LookingFront]),
        ];
        assert_eq!(overall_attention(&statuses), 90.0);
        assert_eq!(teaching_recommendations(&statuses, "history", &params), vec![STATUS_GOOD]);
        assert!(alert_flags(&statuses, &params).is_empty());
    }

    #[test]
    fn test_multiple_recommendations_fire() {
        let params = ClassroomParams::default();
        let statuses = vec![
            status(30.0, FatigueLevel::Drowsy, 10.0, vec![BehaviorTag::EyesClosed]),
            status(50.0, FatigueLevel::Drowsy, 20.0, vec![BehaviorTag::EyesClosed]),
            status(60.0, FatigueLevel::Alert, 65.0, vec![BehaviorTag::LookingFront]),
        ];
        assert_eq!(
            teaching_recommendations(&statuses, "Advanced-MATH-101", &params),
            vec![ATTENTION_CRITICAL, DROWSY_BREAK, LOW_ENGAGEMENT, ABSTRACT_COURSE]
        );
    }

    #[test]
    fn test_warning_tier_and_pace() {
        let params = ClassroomParams::default();
        let mut statuses: Vec<StudentStatus> = (0..9)
            .map(|_| status(65.0, FatigueLevel::Alert, 70.0, Vec::new()))
            .collect();
        statuses.push(status(65.0, FatigueLevel::Drowsy, 35.0, Vec::new()));
        // drowsy ratio exactly 0.1 does not trigger the pace rule
        assert_eq!(teaching_recommendations(&statuses, "art", &params), vec![ATTENTION_WARNING]);

        statuses.push(status(65.0, FatigueLevel::Drowsy, 35.0, Vec::new()));
        assert_eq!(
            teaching_recommendations(&statuses, "art", &params),
            vec![ATTENTION_WARNING, DROWSY_PACE]
        );
    }

    #[test]
    fn test_alert_flags() {
        let params = ClassroomParams::default();
        let sleeping = || status(40.0, FatigueLevel::Drowsy, 0.0, vec![BehaviorTag::HeadDropping]);
        let two = vec![sleeping(), sleeping()];
        assert_eq!(alert_flags(&two, &params).len(), 1);

        let three = vec![sleeping(), sleeping(), sleeping()];
        let flags = alert_flags(&three, &params);
        assert_eq!(flags.len(), 2);
        assert!(flags[0].starts_with('3'));
        assert!(flags[1].contains("asleep"));
    }
}
