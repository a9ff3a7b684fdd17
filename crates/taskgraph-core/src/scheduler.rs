//! The two scheduling operations: an incremental forward propagation for
//! a single moved feature ([`auto_schedule`]), and a full rule-aware
//! recalculation over the whole graph ([`recalculate_schedule`]).

use crate::graph::Graph;
use crate::{Calendar, Dependency, DependencyType, Feature, FeatureId, FeatureUpdate, RuleRegistry, SchedulingRule};
use chrono::{Duration, NaiveDate};
use std::collections::{HashMap, HashSet, VecDeque};

/// Propagates a single moved feature's new dates forward through
/// `FinishToStart`/`StartToStart`/`FinishToFinish`/`StartToFinish`
/// dependencies, preserving every downstream feature's own duration.
/// Calendar-unaware: this operation never consults `rules` at all, so
/// moving a feature across a holiday is the caller's decision, not the
/// engine's.
#[must_use]
pub fn auto_schedule(
    moved_id: &str,
    new_dates: (NaiveDate, NaiveDate),
    features: &[Feature],
    dependencies: &[Dependency],
) -> Vec<FeatureUpdate> {
    let mut updates = Vec::new();
    let mut by_id: HashMap<FeatureId, Feature> =
        features.iter().map(|f| (f.id.clone(), f.clone())).collect();

    if !by_id.contains_key(moved_id) {
        return updates;
    }

    let known: HashSet<&FeatureId> = by_id.keys().collect();
    let mut forward: HashMap<FeatureId, Vec<&Dependency>> = HashMap::new();
    for id in by_id.keys() {
        forward.entry(id.clone()).or_default();
    }
    for dep in dependencies {
        if known.contains(&dep.source_id) && known.contains(&dep.target_id) {
            forward.entry(dep.source_id.clone()).or_default().push(dep);
        }
    }

    {
        let moved = by_id.get_mut(moved_id).unwrap();
        moved.start_at = new_dates.0;
        moved.end_at = new_dates.1;
    }
    updates.push(FeatureUpdate {
        id: moved_id.to_string(),
        start_at: new_dates.0,
        end_at: new_dates.1,
    });

    let mut visited: HashSet<FeatureId> = HashSet::new();
    let mut queue: VecDeque<FeatureId> = VecDeque::new();
    queue.push_back(moved_id.to_string());

    while let Some(current_id) = queue.pop_front() {
        if !visited.insert(current_id.clone()) {
            continue;
        }
        let Some(edges) = forward.get(&current_id) else {
            continue;
        };
        let Some(source) = by_id.get(&current_id).cloned() else {
            continue;
        };
        for dep in edges.clone() {
            let target_id = dep.target_id.clone();
            let Some(target) = by_id.get(&target_id) else {
                continue;
            };
            let duration = target.end_at - target.start_at;
            let (new_start, new_end) = match dep.dep_type {
                DependencyType::FinishToStart => (source.end_at, source.end_at + duration),
                DependencyType::StartToStart => (source.start_at, source.start_at + duration),
                DependencyType::FinishToFinish => (source.end_at - duration, source.end_at),
                DependencyType::StartToFinish => (source.start_at - duration, source.start_at),
            };
            if new_start == target.start_at && new_end == target.end_at {
                continue;
            }
            if let Some(t) = by_id.get_mut(&target_id) {
                t.start_at = new_start;
                t.end_at = new_end;
            }
            updates.push(FeatureUpdate {
                id: target_id.clone(),
                start_at: new_start,
                end_at: new_end,
            });
            queue.push_back(target_id);
        }
    }

    updates
}

/// Recomputes every feature's dates from scratch, honoring calendars,
/// slack, lag, fixed constraints, and day-of-week alignment. Features
/// with no incoming dependency, or pinned by a `Constraint` rule, are
/// left untouched. Processes features in topological order so that by
/// the time a feature is visited, every predecessor already holds its
/// final dates for this pass.
#[must_use]
pub fn recalculate_schedule(
    features: &[Feature],
    dependencies: &[Dependency],
    rules: &[SchedulingRule],
) -> Vec<FeatureUpdate> {
    let mut updates = Vec::new();
    if features.is_empty() {
        return updates;
    }

    let feature_ids: Vec<FeatureId> = features.iter().map(|f| f.id.clone()).collect();
    let graph = Graph::build(&feature_ids, dependencies);
    let calendar = Calendar::new(rules);
    let registry = RuleRegistry::new(rules);

    let mut working: HashMap<FeatureId, Feature> =
        features.iter().map(|f| (f.id.clone(), f.clone())).collect();

    for feature_id in &graph.topo_order {
        if registry.feature_constraint(feature_id).is_some() {
            continue;
        }
        let incoming = match graph.reverse.get(feature_id) {
            Some(edges) if !edges.is_empty() => edges,
            _ => continue,
        };

        let this_duration = {
            let current = &working[feature_id];
            calendar.working_days_between(current.start_at, current.end_at)
        };

        let mut candidate_start: Option<NaiveDate> = None;
        for dep in incoming {
            let Some(source) = working.get(&dep.source_id) else {
                continue;
            };
            let slack = registry.total_slack_days(dep.dep_type, &dep.source_id, feature_id);
            let anchor = match dep.dep_type {
                DependencyType::FinishToStart => calendar.add_working_days(source.end_at, slack),
                DependencyType::StartToStart => calendar.add_working_days(source.start_at, slack),
                DependencyType::FinishToFinish => calendar
                    .subtract_working_days(calendar.add_working_days(source.end_at, slack), this_duration),
                DependencyType::StartToFinish => calendar.subtract_working_days(
                    calendar.add_working_days(source.start_at, slack),
                    this_duration,
                ),
            };
            let lag = registry.lag_days(&dep.source_id, feature_id);
            let candidate = calendar.add_working_days(anchor, lag);
            candidate_start = Some(match candidate_start {
                Some(current) if current >= candidate => current,
                _ => candidate,
            });
        }

        let Some(mut start) = candidate_start else {
            continue;
        };

        if let Some(weekday) = registry.alignment_day(feature_id) {
            start = align_forward(start, weekday);
        }

        let end = calendar.add_working_days(start, this_duration);

        let current = &working[feature_id];
        if start != current.start_at || end != current.end_at {
            updates.push(FeatureUpdate {
                id: feature_id.clone(),
                start_at: start,
                end_at: end,
            });
            if let Some(f) = working.get_mut(feature_id) {
                f.start_at = start;
                f.end_at = end;
            }
        }
    }

    updates
}

/// Snaps `date` forward to the next occurrence of `weekday` (0 = Sunday
/// … 6 = Saturday), leaving it unchanged if it already falls there.
fn align_forward(date: NaiveDate, weekday: u8) -> NaiveDate {
    use chrono::Datelike;
    let current = i64::from(date.weekday().num_days_from_sunday());
    let target = i64::from(weekday);
    let delta = (target - current).rem_euclid(7);
    date + Duration::days(delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AlignmentRule, ConstraintKind, ConstraintRule, HolidayRule, RuleKind, SlackRule};
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn feature(id: &str, start: NaiveDate, end: NaiveDate) -> Feature {
        Feature::new(id, start, end)
    }

    fn fs(id: &str, source: &str, target: &str) -> Dependency {
        Dependency::new(id, source, target, DependencyType::FinishToStart)
    }

    #[test]
    fn auto_schedule_propagates_fs_chain_preserving_duration() {
        let features = vec![
            feature("a", date(2025, 1, 1), date(2025, 1, 5)),
            feature("b", date(2025, 1, 10), date(2025, 1, 12)),
            feature("c", date(2025, 1, 20), date(2025, 1, 25)),
        ];
        let deps = vec![fs("d1", "a", "b"), fs("d2", "b", "c")];
        let updates = auto_schedule("a", (date(2025, 1, 10), date(2025, 1, 15)), &features, &deps);

        let by_id: HashMap<_, _> = updates.into_iter().map(|u| (u.id.clone(), u)).collect();
        assert_eq!(by_id["a"].start_at, date(2025, 1, 10));
        assert_eq!(by_id["a"].end_at, date(2025, 1, 15));
        assert_eq!(by_id["b"].start_at, date(2025, 1, 15));
        assert_eq!(by_id["b"].end_at, date(2025, 1, 17));
        assert_eq!(by_id["c"].start_at, date(2025, 1, 17));
        assert_eq!(by_id["c"].end_at, date(2025, 1, 22));
    }

    #[test]
    fn auto_schedule_on_unknown_feature_is_a_no_op() {
        let features = vec![feature("a", date(2025, 1, 1), date(2025, 1, 5))];
        let updates = auto_schedule("ghost", (date(2025, 1, 1), date(2025, 1, 2)), &features, &[]);
        assert!(updates.is_empty());
    }

    #[test]
    fn recalculate_respects_fs_with_no_rules() {
        let features = vec![
            feature("a", date(2025, 1, 1), date(2025, 1, 5)),
            feature("b", date(2025, 1, 10), date(2025, 1, 12)),
        ];
        let deps = vec![fs("d1", "a", "b")];
        let updates = recalculate_schedule(&features, &deps, &[]);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].id, "b");
        assert_eq!(updates[0].start_at, date(2025, 1, 5));
        assert_eq!(updates[0].end_at, date(2025, 1, 7));
    }

    #[test]
    fn recalculate_is_idempotent_once_applied() {
        let features = vec![
            feature("a", date(2025, 1, 1), date(2025, 1, 5)),
            feature("b", date(2025, 1, 5), date(2025, 1, 7)),
        ];
        let deps = vec![fs("d1", "a", "b")];
        let updates = recalculate_schedule(&features, &deps, &[]);
        assert!(updates.is_empty());
    }

    #[test]
    fn recalculate_applies_slack() {
        let features = vec![
            feature("a", date(2025, 1, 1), date(2025, 1, 10)),
            feature("b", date(2025, 1, 20), date(2025, 1, 22)),
        ];
        let deps = vec![fs("d1", "a", "b")];
        let rules = vec![SchedulingRule::new(
            "slack",
            RuleKind::Slack(SlackRule {
                days: 2,
                dependency_types: None,
                between_features: None,
            }),
        )];
        let updates = recalculate_schedule(&features, &deps, &rules);
        assert_eq!(updates[0].start_at, date(2025, 1, 12));
    }

    #[test]
    fn recalculate_skips_fixed_constraint_feature() {
        let features = vec![
            feature("a", date(2025, 1, 1), date(2025, 1, 10)),
            feature("b", date(2025, 1, 20), date(2025, 1, 22)),
        ];
        let deps = vec![fs("d1", "a", "b")];
        let rules = vec![SchedulingRule::new(
            "fixed-b",
            RuleKind::Constraint(ConstraintRule {
                kind: ConstraintKind::FixedBoth,
                feature_ids: vec!["b".into()],
            }),
        )];
        let updates = recalculate_schedule(&features, &deps, &rules);
        assert!(updates.is_empty());
    }

    #[test]
    fn recalculate_honors_multiple_predecessors_via_max() {
        let features = vec![
            feature("a", date(2025, 1, 1), date(2025, 1, 5)),
            feature("b", date(2025, 1, 1), date(2025, 1, 20)),
            feature("c", date(2025, 2, 1), date(2025, 2, 3)),
        ];
        let deps = vec![fs("d1", "a", "c"), fs("d2", "b", "c")];
        let updates = recalculate_schedule(&features, &deps, &[]);
        assert_eq!(updates[0].start_at, date(2025, 1, 20));
    }

    #[test]
    fn recalculate_aligns_start_forward_to_weekday() {
        // Jan 5, 2025 is a Sunday; align forward to Monday (weekday 1).
        let features = vec![
            feature("a", date(2025, 1, 1), date(2025, 1, 5)),
            feature("b", date(2025, 1, 10), date(2025, 1, 12)),
        ];
        let deps = vec![fs("d1", "a", "b")];
        let rules = vec![SchedulingRule::new(
            "align",
            RuleKind::Alignment(AlignmentRule {
                weekday: 1,
                feature_ids: vec![],
            }),
        )];
        let updates = recalculate_schedule(&features, &deps, &rules);
        assert_eq!(updates[0].start_at, date(2025, 1, 6));
    }

    #[test]
    fn recalculate_skips_forward_skip_over_weekend_holiday() {
        let features = vec![
            // A ends on a Saturday; B's duration spans a weekend so it's 3 working days.
            feature("a", date(2025, 1, 1), date(2025, 1, 4)),
            feature("b", date(2025, 1, 10), date(2025, 1, 17)),
        ];
        let deps = vec![fs("d1", "a", "b")];
        let rules = vec![SchedulingRule::new(
            "weekends",
            RuleKind::Holiday(HolidayRule::Weekdays(vec![0, 6])),
        )];
        let updates = recalculate_schedule(&features, &deps, &rules);
        // Saturday Jan 4 skips forward to Monday Jan 6.
        assert_eq!(updates[0].start_at, date(2025, 1, 6));
    }

    #[test]
    fn recalculate_ignores_root_feature_with_no_incoming_edges() {
        let features = vec![feature("a", date(2025, 1, 1), date(2025, 1, 5))];
        let updates = recalculate_schedule(&features, &[], &[]);
        assert!(updates.is_empty());
    }
}
