//! Lookup helpers over the subset of rules that affect scheduling math
//! directly (slack, lag, constraints, alignment) rather than calendar
//! shape or capacity, which live in [`crate::calendar`] and
//! [`crate::capacity`] respectively.

use crate::{
    ConstraintRule, DependencyType, DurationValidation, Feature, RuleKind, SchedulingRule,
};

/// Pre-filters a rule slice down to the enabled rules once, since a full
/// recalculation queries it once per feature per dependency.
pub struct RuleRegistry<'a> {
    rules: Vec<&'a SchedulingRule>,
}

impl<'a> RuleRegistry<'a> {
    #[must_use]
    pub fn new(rules: &'a [SchedulingRule]) -> Self {
        Self {
            rules: rules.iter().filter(|r| r.enabled).collect(),
        }
    }

    /// Sum of every `Slack` rule's `days` that applies to an edge of this
    /// `dep_type` between this exact `(source_id, target_id)` pair.
    /// A rule with no `dependency_types` filter applies to every type; a
    /// rule with no `between_features` filter applies to every pair.
    #[must_use]
    pub fn total_slack_days(
        &self,
        dep_type: DependencyType,
        source_id: &str,
        target_id: &str,
    ) -> i64 {
        self.rules
            .iter()
            .filter_map(|rule| match &rule.kind {
                RuleKind::Slack(slack) => {
                    let type_matches = slack
                        .dependency_types
                        .as_ref()
                        .map_or(true, |types| types.contains(&dep_type));
                    let pair_matches = slack.between_features.as_ref().map_or(true, |pairs| {
                        pairs
                            .iter()
                            .any(|(s, t)| s == source_id && t == target_id)
                    });
                    (type_matches && pair_matches).then_some(slack.days)
                }
                _ => None,
            })
            .sum()
    }

    /// Extra working-day offset for one specific `(source_id, target_id)`
    /// edge, or `0` if no `Lag` rule names that exact pair.
    #[must_use]
    pub fn lag_days(&self, source_id: &str, target_id: &str) -> i64 {
        self.rules
            .iter()
            .find_map(|rule| match &rule.kind {
                RuleKind::Lag {
                    source_id: s,
                    target_id: t,
                    days,
                } if s == source_id && t == target_id => Some(*days),
                _ => None,
            })
            .unwrap_or(0)
    }

    /// First `Constraint` rule that names `feature_id` (or applies to
    /// every feature), in input order.
    #[must_use]
    pub fn feature_constraint(&self, feature_id: &str) -> Option<&ConstraintRule> {
        self.rules.iter().find_map(|rule| match &rule.kind {
            RuleKind::Constraint(c)
                if c.feature_ids.is_empty() || c.feature_ids.iter().any(|f| f == feature_id) =>
            {
                Some(c)
            }
            _ => None,
        })
    }

    /// First `Alignment` rule's target weekday that applies to
    /// `feature_id`, if any.
    #[must_use]
    pub fn alignment_day(&self, feature_id: &str) -> Option<u8> {
        self.rules.iter().find_map(|rule| match &rule.kind {
            RuleKind::Alignment(a)
                if a.feature_ids.is_empty() || a.feature_ids.iter().any(|f| f == feature_id) =>
            {
                Some(a.weekday)
            }
            _ => None,
        })
    }

    /// Checks `feature`'s calendar-day duration against every applicable
    /// `Duration` rule, stopping at the first violation.
    #[must_use]
    pub fn validate_duration(&self, feature: &Feature) -> DurationValidation {
        let actual = feature.duration_days();
        for rule in &self.rules {
            let RuleKind::Duration(d) = &rule.kind else {
                continue;
            };
            let applies = d.feature_ids.is_empty() || d.feature_ids.iter().any(|f| f == &feature.id);
            if !applies {
                continue;
            }
            if let Some(min) = d.min_days {
                if actual < min {
                    return DurationValidation {
                        valid: false,
                        min_days: d.min_days,
                        max_days: d.max_days,
                        message: Some(format!(
                            "feature '{}' spans {actual} day(s), below the minimum of {min}",
                            feature.id
                        )),
                    };
                }
            }
            if let Some(max) = d.max_days {
                if actual > max {
                    return DurationValidation {
                        valid: false,
                        min_days: d.min_days,
                        max_days: d.max_days,
                        message: Some(format!(
                            "feature '{}' spans {actual} day(s), above the maximum of {max}",
                            feature.id
                        )),
                    };
                }
            }
        }
        DurationValidation::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AlignmentRule, ConstraintKind, DurationRule, SlackRule};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn feature(id: &str, start: (i32, u32, u32), end: (i32, u32, u32)) -> Feature {
        Feature::new(
            id,
            NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        )
    }

    #[test]
    fn slack_applies_when_unfiltered() {
        let rules = vec![SchedulingRule::new(
            "s1",
            RuleKind::Slack(SlackRule {
                days: 2,
                dependency_types: None,
                between_features: None,
            }),
        )];
        let registry = RuleRegistry::new(&rules);
        assert_eq!(
            registry.total_slack_days(DependencyType::FinishToStart, "a", "b"),
            2
        );
    }

    #[test]
    fn slack_filtered_by_dependency_type() {
        let rules = vec![SchedulingRule::new(
            "s1",
            RuleKind::Slack(SlackRule {
                days: 3,
                dependency_types: Some(vec![DependencyType::StartToStart]),
                between_features: None,
            }),
        )];
        let registry = RuleRegistry::new(&rules);
        assert_eq!(
            registry.total_slack_days(DependencyType::FinishToStart, "a", "b"),
            0
        );
        assert_eq!(
            registry.total_slack_days(DependencyType::StartToStart, "a", "b"),
            3
        );
    }

    #[test]
    fn lag_only_matches_exact_pair() {
        let rules = vec![SchedulingRule::new(
            "l1",
            RuleKind::Lag {
                source_id: "a".into(),
                target_id: "b".into(),
                days: -1,
            },
        )];
        let registry = RuleRegistry::new(&rules);
        assert_eq!(registry.lag_days("a", "b"), -1);
        assert_eq!(registry.lag_days("a", "c"), 0);
    }

    #[test]
    fn first_matching_constraint_wins() {
        let rules = vec![
            SchedulingRule::new(
                "c1",
                RuleKind::Constraint(ConstraintRule {
                    kind: ConstraintKind::FixedStart,
                    feature_ids: vec!["a".into()],
                }),
            ),
            SchedulingRule::new(
                "c2",
                RuleKind::Constraint(ConstraintRule {
                    kind: ConstraintKind::FixedBoth,
                    feature_ids: vec![],
                }),
            ),
        ];
        let registry = RuleRegistry::new(&rules);
        assert_eq!(
            registry.feature_constraint("a").map(|c| c.kind),
            Some(ConstraintKind::FixedStart)
        );
        assert_eq!(
            registry.feature_constraint("z").map(|c| c.kind),
            Some(ConstraintKind::FixedBoth)
        );
    }

    #[test]
    fn alignment_applies_to_listed_features_only() {
        let rules = vec![SchedulingRule::new(
            "align",
            RuleKind::Alignment(AlignmentRule {
                weekday: 1,
                feature_ids: vec!["a".into()],
            }),
        )];
        let registry = RuleRegistry::new(&rules);
        assert_eq!(registry.alignment_day("a"), Some(1));
        assert_eq!(registry.alignment_day("b"), None);
    }

    #[test]
    fn duration_validation_reports_first_violation() {
        let rules = vec![SchedulingRule::new(
            "d1",
            RuleKind::Duration(DurationRule {
                min_days: Some(5),
                max_days: None,
                feature_ids: vec![],
            }),
        )];
        let registry = RuleRegistry::new(&rules);
        let f = feature("a", (2025, 1, 1), (2025, 1, 2));
        let result = registry.validate_duration(&f);
        assert!(!result.valid);
        assert_eq!(result.min_days, Some(5));
    }

    #[test]
    fn duration_validation_passes_when_in_range() {
        let rules = vec![SchedulingRule::new(
            "d1",
            RuleKind::Duration(DurationRule {
                min_days: Some(1),
                max_days: Some(10),
                feature_ids: vec![],
            }),
        )];
        let registry = RuleRegistry::new(&rules);
        let f = feature("a", (2025, 1, 1), (2025, 1, 5));
        assert_eq!(registry.validate_duration(&f), DurationValidation::ok());
    }

    #[test]
    fn disabled_rules_are_invisible_to_registry() {
        let rules = vec![SchedulingRule::new(
            "l1",
            RuleKind::Lag {
                source_id: "a".into(),
                target_id: "b".into(),
                days: 5,
            },
        )
        .disabled()];
        let registry = RuleRegistry::new(&rules);
        assert_eq!(registry.lag_days("a", "b"), 0);
    }
}
