//! Advisory-only concurrency checking, grounded on the teacher's resource
//! timeline but simplified to a sweep-line peak count: the capacity rule
//! here only ever needs "how many overlap at once and who", not a full
//! day-by-day usage breakdown.

use crate::{CapacityRule, CapacityWarning, Feature, ResourceGroupBy, RuleKind, SchedulingRule};
use std::collections::BTreeMap;

/// Evaluates every enabled `Capacity` rule against `features`, grouping
/// by owner or group as the rule specifies, and reports every group
/// whose peak concurrent feature count exceeds the rule's limit.
#[must_use]
pub fn check_capacity(features: &[Feature], rules: &[SchedulingRule]) -> Vec<CapacityWarning> {
    let mut warnings = Vec::new();

    for rule in rules.iter().filter(|r| r.enabled) {
        let RuleKind::Capacity(cap) = &rule.kind else {
            continue;
        };

        let mut groups: BTreeMap<String, Vec<&Feature>> = BTreeMap::new();
        for feature in features {
            let key = match cap.group_by {
                ResourceGroupBy::Owner => feature.owner_id.as_ref(),
                ResourceGroupBy::Group => feature.group_id.as_ref(),
            };
            if let Some(key) = key {
                groups.entry(key.clone()).or_default().push(feature);
            }
        }

        for (resource_id, group_features) in groups {
            let peak = peak_concurrency(&group_features);
            if peak > cap.max_concurrent {
                warnings.push(CapacityWarning {
                    resource_id,
                    group_by: cap.group_by,
                    max_concurrent: cap.max_concurrent,
                    actual: peak,
                    feature_names: group_features.iter().map(|f| f.name.clone()).collect(),
                });
            }
        }
    }

    warnings
}

/// One `+1` event at every feature's start and one `-1` at its end, sorted
/// by date with `-1` ordered before `+1` on ties so a feature ending the
/// same day another starts does not count as an overlap.
fn peak_concurrency(features: &[&Feature]) -> usize {
    let mut events: Vec<(chrono::NaiveDate, i32)> = Vec::with_capacity(features.len() * 2);
    for feature in features {
        events.push((feature.start_at, 1));
        events.push((feature.end_at, -1));
    }
    events.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut current: i64 = 0;
    let mut peak: i64 = 0;
    for (_, delta) in events {
        current += i64::from(delta);
        peak = peak.max(current);
    }
    peak.max(0) as usize
}
