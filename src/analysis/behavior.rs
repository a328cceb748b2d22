use super::config::BehaviorParams;
use super::types::{BehaviorTag, FatigueLevel, HeadPose};

type Predicate = fn(&HeadPose, FatigueLevel, &BehaviorParams) -> bool;

struct BehaviorRule {
    tag: BehaviorTag,
    applies: Predicate,
}

// Gaze direction: at most one tag, first match wins.
const DIRECTION_RULES: &[BehaviorRule] = &[
    BehaviorRule {
        tag: BehaviorTag::LookingFront,
        applies: |pose, _, p| pose.yaw.abs() <= p.yaw_front && pose.pitch.abs() <= p.pitch_front,
    },
    BehaviorRule {
        tag: BehaviorTag::LookingDown,
        applies: |pose, _, p| pose.yaw.abs() <= p.yaw_front && pose.pitch > p.pitch_down,
    },
    BehaviorRule {
        tag: BehaviorTag::TurningAround,
        applies: |pose, _, p| pose.yaw.abs() > p.yaw_turning,
    },
    BehaviorRule {
        tag: BehaviorTag::LookingLeft,
        applies: |pose, _, p| pose.yaw > p.yaw_side,
    },
    BehaviorRule {
        tag: BehaviorTag::LookingRight,
        applies: |pose, _, p| pose.yaw < -p.yaw_side,
    },
];

// Fatigue and posture: every matching rule fires, in table order.
const STATE_RULES: &[BehaviorRule] = &[
    BehaviorRule {
        tag: BehaviorTag::EyesClosed,
        applies: |_, fatigue, _| fatigue == FatigueLevel::Drowsy,
    },
    BehaviorRule {
        tag: BehaviorTag::HeadDropping,
        applies: |pose, fatigue, p| fatigue == FatigueLevel::Drowsy && pose.pitch > p.pitch_sleep,
    },
    BehaviorRule {
        tag: BehaviorTag::RubbingEyes,
        applies: |_, fatigue, _| fatigue == FatigueLevel::Tired,
    },
    BehaviorRule {
        tag: BehaviorTag::HeadDown,
        applies: |pose, _, p| pose.pitch.abs() > p.pitch_head_down,
    },
];

#[derive(Debug, Clone, Default)]
pub struct BehaviorTagger {
    params: BehaviorParams,
}

impl BehaviorTagger {
    pub fn new(params: BehaviorParams) -> Self {
        Self { params }
    }

    pub fn tag(&self, head_pose: &HeadPose, fatigue: FatigueLevel) -> Vec<BehaviorTag> {
        let mut tags = Vec::with_capacity(4);

        if let Some(rule) = DIRECTION_RULES
            .iter()
            .find(|rule| (rule.applies)(head_pose, fatigue, &self.params))
        {
            tags.push(rule.tag);
        }

        tags.extend(
            STATE_RULES
                .iter()
                .filter(|rule| (rule.applies)(head_pose, fatigue, &self.params))
                .map(|rule| rule.tag),
        );

        tags
    }
}

pub fn is_attentive(tags: &[BehaviorTag]) -> bool {
    let attentive = tags
        .iter()
        .any(|t| matches!(t, BehaviorTag::LookingFront | BehaviorTag::LookingDown));
    let distracting = tags.iter().any(|t| {
        matches!(
            t,
            BehaviorTag::TurningAround | BehaviorTag::HeadDropping | BehaviorTag::EyesClosed
        )
    });
    attentive && !distracting
}
