//! Working-day arithmetic over a set of `Holiday`/`Blackout` rules.

use crate::{HolidayRule, RuleKind, SchedulingRule};
use chrono::{Datelike, Duration, NaiveDate};

/// Borrows a rule slice and answers working-day questions against it.
///
/// When no `Holiday` or `Blackout` rule is enabled, every method reduces
/// to plain calendar-day arithmetic — a deliberate fast path, not just an
/// optimization: it keeps the common "no time-off configured" project
/// behaving like simple date subtraction rather than silently treating
/// every day as a working day one at a time.
pub struct Calendar<'a> {
    rules: &'a [SchedulingRule],
}

impl<'a> Calendar<'a> {
    #[must_use]
    pub fn new(rules: &'a [SchedulingRule]) -> Self {
        Self { rules }
    }

    fn has_time_off_rules(&self) -> bool {
        self.rules.iter().any(|r| {
            r.enabled && matches!(r.kind, RuleKind::Holiday(_) | RuleKind::Blackout { .. })
        })
    }

    /// True if `date` is a holiday or inside a blackout window.
    #[must_use]
    pub fn is_non_working(&self, date: NaiveDate) -> bool {
        for rule in self.rules {
            if !rule.enabled {
                continue;
            }
            match &rule.kind {
                RuleKind::Holiday(HolidayRule::Weekdays(days)) => {
                    let weekday = date.weekday().num_days_from_sunday() as u8;
                    if days.contains(&weekday) {
                        return true;
                    }
                }
                RuleKind::Holiday(HolidayRule::Dates(dates)) => {
                    if dates.contains(&date) {
                        return true;
                    }
                }
                RuleKind::Holiday(HolidayRule::Recurring { month, day }) => {
                    if date.month() == *month && date.day() == *day {
                        return true;
                    }
                }
                RuleKind::Blackout { start, end } => {
                    if date >= *start && date <= *end {
                        return true;
                    }
                }
                _ => {}
            }
        }
        false
    }

    /// Advances (or, for negative `n`, retreats) from `from` by `n`
    /// working days. First skips `from` itself forward past any
    /// non-working days, then steps one day at a time, counting only
    /// working days toward `n`. `n == 0` returns the skipped-forward
    /// anchor unchanged.
    #[must_use]
    pub fn add_working_days(&self, from: NaiveDate, n: i64) -> NaiveDate {
        if n < 0 {
            return self.subtract_working_days(from, -n);
        }
        if !self.has_time_off_rules() {
            return from + Duration::days(n);
        }
        let mut date = from;
        while self.is_non_working(date) {
            let next = date.succ_opt().unwrap_or(date);
            if next == date {
                break;
            }
            date = next;
        }
        let mut remaining = n;
        while remaining > 0 {
            let next = date.succ_opt().unwrap_or(date);
            if next == date {
                break;
            }
            date = next;
            if !self.is_non_working(date) {
                remaining -= 1;
            }
        }
        date
    }

    /// Mirror of [`Calendar::add_working_days`] stepping backward.
    #[must_use]
    pub fn subtract_working_days(&self, from: NaiveDate, n: i64) -> NaiveDate {
        if n < 0 {
            return self.add_working_days(from, -n);
        }
        if !self.has_time_off_rules() {
            return from - Duration::days(n);
        }
        let mut date = from;
        while self.is_non_working(date) {
            let prev = date.pred_opt().unwrap_or(date);
            if prev == date {
                break;
            }
            date = prev;
        }
        let mut remaining = n;
        while remaining > 0 {
            let prev = date.pred_opt().unwrap_or(date);
            if prev == date {
                break;
            }
            date = prev;
            if !self.is_non_working(date) {
                remaining -= 1;
            }
        }
        date
    }

    /// Number of working days in the half-open range `[a, b)`. Negative
    /// if `b` precedes `a`. Reduces to plain calendar-day subtraction
    /// under the same no-time-off fast path as the other methods.
    #[must_use]
    pub fn working_days_between(&self, a: NaiveDate, b: NaiveDate) -> i64 {
        if !self.has_time_off_rules() {
            return (b - a).num_days();
        }
        if b < a {
            return -self.working_days_between(b, a);
        }
        let mut date = a;
        let mut count = 0i64;
        while date < b {
            if !self.is_non_working(date) {
                count += 1;
            }
            let next = date.succ_opt().unwrap_or(date);
            if next == date {
                break;
            }
            date = next;
        }
        count
    }
}
