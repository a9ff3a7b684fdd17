//! Deterministic, I/O-free engine for project-schedule propagation.
//!
//! Given a set of features, typed dependencies between them, and a set of
//! scheduling rules (calendars, slack, lag, constraints, duration limits,
//! alignment, capacity), this crate computes the start/end dates that
//! should result from moving a feature or from a full recalculation, and
//! separately routes orthogonal dependency arrows between feature boxes on
//! a timeline. Every public entry point is a pure function over borrowed
//! data; nothing here touches the filesystem, the network, or a clock.

pub mod calendar;
pub mod capacity;
pub mod geometry;
pub mod graph;
pub mod router;
pub mod rules;
pub mod scheduler;

pub use calendar::Calendar;
pub use capacity::check_capacity;
pub use geometry::{Point, Rect};
pub use graph::{Graph, GraphError};
pub use router::compute_dependency_path;
pub use rules::RuleRegistry;
pub use scheduler::{auto_schedule, recalculate_schedule};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type FeatureId = String;
pub type DependencyId = String;
pub type RuleId = String;

/// A unit of schedulable work with a fixed calendar start and end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub name: String,
    pub start_at: NaiveDate,
    pub end_at: NaiveDate,
    pub owner_id: Option<String>,
    pub group_id: Option<String>,
}

impl Feature {
    pub fn new(id: impl Into<FeatureId>, start_at: NaiveDate, end_at: NaiveDate) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            start_at,
            end_at,
            owner_id: None,
            group_id: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    #[must_use]
    pub fn group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Calendar-day span, `end_at - start_at`. Not calendar-aware; see
    /// [`Calendar::working_days_between`] for the working-day equivalent.
    #[must_use]
    pub fn duration_days(&self) -> i64 {
        (self.end_at - self.start_at).num_days()
    }
}

/// How a dependency constrains its target relative to its source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyType {
    #[default]
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: DependencyId,
    pub source_id: FeatureId,
    pub target_id: FeatureId,
    pub dep_type: DependencyType,
    /// Display-only hint for the host renderer; the scheduler and router
    /// never read it.
    #[serde(default)]
    pub color: Option<String>,
}

impl Dependency {
    pub fn new(
        id: impl Into<DependencyId>,
        source_id: impl Into<FeatureId>,
        target_id: impl Into<FeatureId>,
        dep_type: DependencyType,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            dep_type,
            color: None,
        }
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// A named, independently toggleable scheduling rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchedulingRule {
    pub id: RuleId,
    pub enabled: bool,
    pub kind: RuleKind,
}

impl SchedulingRule {
    #[must_use]
    pub fn new(id: impl Into<RuleId>, kind: RuleKind) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            kind,
        }
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RuleKind {
    Holiday(HolidayRule),
    Blackout { start: NaiveDate, end: NaiveDate },
    Slack(SlackRule),
    Lag {
        source_id: FeatureId,
        target_id: FeatureId,
        days: i64,
    },
    Constraint(ConstraintRule),
    Duration(DurationRule),
    Alignment(AlignmentRule),
    Capacity(CapacityRule),
}

/// `weekday` follows `chrono`'s `num_days_from_sunday`: 0 = Sunday … 6 = Saturday.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum HolidayRule {
    Weekdays(Vec<u8>),
    Dates(Vec<NaiveDate>),
    Recurring { month: u32, day: u32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlackRule {
    pub days: i64,
    pub dependency_types: Option<Vec<DependencyType>>,
    pub between_features: Option<Vec<(FeatureId, FeatureId)>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    FixedStart,
    FixedEnd,
    FixedBoth,
}

/// An empty `feature_ids` applies to every feature; otherwise only to the
/// ones listed, mirroring [`AlignmentRule`] and [`DurationRule`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstraintRule {
    pub kind: ConstraintKind,
    pub feature_ids: Vec<FeatureId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DurationRule {
    pub min_days: Option<i64>,
    pub max_days: Option<i64>,
    pub feature_ids: Vec<FeatureId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignmentRule {
    pub weekday: u8,
    pub feature_ids: Vec<FeatureId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceGroupBy {
    Owner,
    Group,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapacityRule {
    pub max_concurrent: usize,
    pub group_by: ResourceGroupBy,
}

/// One feature's new dates, as produced by [`auto_schedule`] or
/// [`recalculate_schedule`]. Only features that actually changed are
/// represented; the caller is responsible for applying these back onto
/// its own copy of the feature set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureUpdate {
    pub id: FeatureId,
    pub start_at: NaiveDate,
    pub end_at: NaiveDate,
}

/// A resource or group that exceeds its `Capacity` rule's concurrency
/// limit on at least one day. Advisory only; never blocks scheduling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityWarning {
    pub resource_id: String,
    pub group_by: ResourceGroupBy,
    pub max_concurrent: usize,
    pub actual: usize,
    pub feature_names: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationValidation {
    pub valid: bool,
    pub min_days: Option<i64>,
    pub max_days: Option<i64>,
    pub message: Option<String>,
}

impl DurationValidation {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            valid: true,
            min_days: None,
            max_days: None,
            message: None,
        }
    }
}

/// Validates a single feature's duration against any `Duration` rules
/// that apply to it, stopping at the first violation (input order).
#[must_use]
pub fn validate_duration(feature: &Feature, rules: &[SchedulingRule]) -> DurationValidation {
    RuleRegistry::new(rules).validate_duration(feature)
}

/// Pixel-space bounding box of a rendered feature bar, used only by the
/// arrow router — the scheduler never deals in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeaturePosition {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// A non-endpoint feature's box, treated as something the routed arrow
/// should not pass through.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub feature_id: FeatureId,
    pub position: FeaturePosition,
}

pub type PositionMap = HashMap<FeatureId, FeaturePosition>;
