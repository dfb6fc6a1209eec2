//! Derived devlog statistics: streaks and hour totals.
//!
//! A devlog "qualifies" once at least one of the projects it links has been
//! submitted for review. Approved stats only count qualifying devlogs; total
//! stats count everything the user logged.

use crate::models::Devlog;
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
    pub current: u32,
    pub longest: u32,
}

/// Aggregated stats used by the quest engine
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevlogStats {
    pub total_hours: Decimal,
    pub approved_hours: Decimal,
    pub total_art_hours: Decimal,
    pub approved_art_hours: Decimal,
    pub total_devlogs: u32,
    pub approved_devlogs: u32,
    pub current_streak: u32,
    pub max_streak: u32,
}

/// Whether the devlog links a project that has been submitted
pub fn qualifies(devlog: &Devlog, submitted_ids: &HashSet<String>) -> bool {
    devlog.project_ids.iter().any(|id| submitted_ids.contains(id))
}

/// Runs of consecutive days. The current run is the one ending on the
/// latest day, and is 0 once that day is before yesterday.
pub fn compute_streaks(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> StreakSummary {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for day in days {
        run = match previous {
            Some(prev) if *day - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*day);
    }

    let current = match previous {
        Some(last) if last >= today - Duration::days(1) => run,
        _ => 0,
    };

    StreakSummary { current, longest }
}

pub fn calculate_approved_hours(devlogs: &[Devlog], submitted_ids: &HashSet<String>) -> Decimal {
    devlogs
        .iter()
        .filter(|d| qualifies(d, submitted_ids))
        .map(Devlog::logged_hours)
        .sum()
}

pub fn calculate_total_hours(devlogs: &[Devlog]) -> Decimal {
    devlogs.iter().map(Devlog::logged_hours).sum()
}

/// Compute every derived stat in one pass over the user's devlogs
pub fn compute_stats(
    devlogs: &[Devlog],
    submitted_ids: &HashSet<String>,
    today: NaiveDate,
) -> DevlogStats {
    let mut stats = DevlogStats::default();
    let mut days = BTreeSet::new();

    for devlog in devlogs {
        stats.total_devlogs += 1;
        stats.total_art_hours += devlog.art_hours;

        if qualifies(devlog, submitted_ids) {
            stats.approved_devlogs += 1;
            stats.approved_art_hours += devlog.art_hours;
            days.insert(devlog.created_time.date_naive());
        }
    }

    stats.total_hours = calculate_total_hours(devlogs);
    stats.approved_hours = calculate_approved_hours(devlogs, submitted_ids);

    let streaks = compute_streaks(&days, today);
    stats.current_streak = streaks.current;
    stats.max_streak = streaks.longest;

    stats
}
