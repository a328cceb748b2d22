use super::types::{BehaviorTag, FatigueLevel};

pub const WAKE_INTERVENTION: &str =
    "Student appears drowsy; give a gentle reminder or ask them to stand for a moment";
pub const ENGAGEMENT_PROMPT: &str = "Student looks slightly tired; try drawing them in with a question";
pub const URGENT_INTERVENTION: &str =
    "Attention is severely scattered; walk over to the student and intervene";
pub const INTERACTIVITY_PROMPT: &str = "Attention is middling; add an interactive segment";
pub const DISCIPLINE_REMINDER: &str =
    "Student is talking to classmates behind them; keep classroom order";

pub fn fatigue_penalty(fatigue: FatigueLevel) -> f64 {
    match fatigue {
        FatigueLevel::Alert => 0.0,
        FatigueLevel::Tired => -10.0,
        FatigueLevel::Drowsy => -30.0,
    }
}

pub fn behavior_bonus(tag: BehaviorTag) -> f64 {
    match tag {
        BehaviorTag::LookingFront => 5.0,
        BehaviorTag::TurningAround => -5.0,
        BehaviorTag::HeadDropping => -20.0,
        _ => 0.0,
    }
}

pub fn engagement(attention: f64, fatigue: FatigueLevel, behaviors: &[BehaviorTag]) -> f64 {
    let bonus: f64 = behaviors.iter().map(|&tag| behavior_bonus(tag)).sum();
    (attention + fatigue_penalty(fatigue) + bonus).clamp(0.0, 100.0)
}

struct SuggestionRule {
    message: &'static str,
    applies: fn(f64, FatigueLevel, &[BehaviorTag]) -> bool,
}

/// Grouped suggestion rules. Within a group the first match wins; groups are
/// evaluated in order and each may contribute one message.
const SUGGESTION_GROUPS: &[&[SuggestionRule]] = &[
    &[
        SuggestionRule {
            message: WAKE_INTERVENTION,
            applies: |_, fatigue, _| fatigue == FatigueLevel::Drowsy,
        },
        SuggestionRule {
            message: ENGAGEMENT_PROMPT,
            applies: |_, fatigue, _| fatigue == FatigueLevel::Tired,
        },
    ],
    &[
        SuggestionRule {
            message: URGENT_INTERVENTION,
            applies: |attention, _, _| attention < 40.0,
        },
        SuggestionRule {
            message: INTERACTIVITY_PROMPT,
            applies: |attention, _, _| attention < 60.0,
        },
    ],
    &[SuggestionRule {
        message: DISCIPLINE_REMINDER,
        applies: |_, _, behaviors| behaviors.contains(&BehaviorTag::TurningAround),
    }],
];

pub fn suggestions(attention: f64, fatigue: FatigueLevel, behaviors: &[BehaviorTag]) -> Vec<String> {
    SUGGESTION_GROUPS
        .iter()
        .filter_map(|group| {
            group
                .iter()
                .find(|rule| (rule.applies)(attention, fatigue, behaviors))
        })
        .map(|rule| rule.message.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_engagement_examples() {
        assert_eq!(engagement(100.0, FatigueLevel::Alert, &[BehaviorTag::LookingFront]), 100.0);
        assert_eq!(engagement(60.0, FatigueLevel::Alert, &[BehaviorTag::TurningAround]), 55.0);
        assert_eq!(
            engagement(
                75.0,
                FatigueLevel::Drowsy,
                &[BehaviorTag::LookingDown, BehaviorTag::EyesClosed, BehaviorTag::HeadDropping]
            ),
            25.0
        );
        assert_eq!(engagement(10.0, FatigueLevel::Drowsy, &[BehaviorTag::HeadDropping]), 0.0);
    }

    #[test]
    fn test_suggestion_order() {
        let out = suggestions(30.0, FatigueLevel::Drowsy, &[BehaviorTag::TurningAround]);
        assert_eq!(
            out,
            vec![
                WAKE_INTERVENTION.to_string(),
                URGENT_INTERVENTION.to_string(),
                DISCIPLINE_REMINDER.to_string(),
            ]
        );
    }

    #[test]
    fn test_suggestion_fallthrough() {
        assert_eq!(
            suggestions(55.0, FatigueLevel::Tired, &[]),
            vec![ENGAGEMENT_PROMPT.to_string(), INTERACTIVITY_PROMPT.to_string()]
        );
        assert!(suggestions(90.0, FatigueLevel::Alert, &[BehaviorTag::LookingFront]).is_empty());
    }

    fn arb_fatigue() -> impl Strategy<Value = FatigueLevel> {
        prop_oneof![
            Just(FatigueLevel::Alert),
            Just(FatigueLevel::Tired),
            Just(FatigueLevel::Drowsy),
        ]
    }

    proptest! {
        #[test]
        fn prop_engagement_in_range(
            attention in 0.0f64..=100.0,
            fatigue in arb_fatigue(),
            behaviors in proptest::sample::subsequence(BehaviorTag::ALL.to_vec(), 0..=BehaviorTag::ALL.len()),
        ) {
            let value = engagement(attention, fatigue, &behaviors);
            prop_assert!((0.0..=100.0).contains(&value));
        }
    }
}
