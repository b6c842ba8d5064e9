//! Run-length encoding of streaks
//!
//! Walks a normalized, sorted bucket once and annotates every row with the
//! length of the uninterrupted run ending at it. Each row only looks at the
//! row immediately before it.
//!
//! A row breaks the run when it belongs to a different habit than the previous
//! row or when its period is not the one directly after the previous period.

use tracing::debug;

use crate::types::{NormalizedCheckOff, PeriodKey, StreakRecord, WeekAdjacency};

/// Encoder that turns sorted period rows into running streak counts
#[derive(Debug, Clone, Copy, Default)]
pub struct RunLengthEncoder {
    week_adjacency: WeekAdjacency,
}

impl RunLengthEncoder {
    pub fn new(week_adjacency: WeekAdjacency) -> Self {
        Self { week_adjacency }
    }

    /// Annotate rows already sorted by (habit name, period)
    pub fn encode(&self, rows: Vec<NormalizedCheckOff>) -> Vec<StreakRecord> {
        let mut records: Vec<StreakRecord> = Vec::with_capacity(rows.len());

        for row in rows {
            let previous = records.last().filter(|prev| prev.name == row.name);

            let gap = previous.and_then(|prev| period_gap(&prev.period, &row.period, self.week_adjacency));
            let is_break = gap != Some(1);
            let streak_helper = match previous {
                Some(prev) if !is_break => prev.streak_helper + 1,
                _ => 0,
            };
            let streak_count = if is_break { 1 } else { streak_helper + 1 };

            records.push(StreakRecord {
                habit_id: row.habit_id,
                name: row.name,
                periodicity: row.periodicity,
                date: row.date,
                period: row.period,
                gap,
                is_break,
                streak_helper,
                streak_count,
            });
        }

        debug!(
            rows = records.len(),
            runs = records.iter().filter(|r| r.is_break).count(),
            "encoded streak runs"
        );

        records
    }
}

/// Distance in periods from `previous` to `current`.
///
/// Returns `None` when the keys are of different kinds or a week key does not
/// name a real ISO week.
pub fn period_gap(previous: &PeriodKey, current: &PeriodKey, adjacency: WeekAdjacency) -> Option<i64> {
    match (*previous, *current) {
        (PeriodKey::Day(prev), PeriodKey::Day(cur)) => Some((cur - prev).num_days()),
        (PeriodKey::Week { .. }, PeriodKey::Week { .. }) => match adjacency {
            WeekAdjacency::Calendar => {
                let prev = previous.start_date()?;
                let cur = current.start_date()?;
                Some((cur - prev).num_days() / 7)
            }
            WeekAdjacency::WeekNumber => week_number_gap(previous, current),
        },
        _ => None,
    }
}

/// Raw week-number difference; week 52 followed by week 1 counts as adjacent
fn week_number_gap(previous: &PeriodKey, current: &PeriodKey) -> Option<i64> {
    match (*previous, *current) {
        (PeriodKey::Week { week: 52, .. }, PeriodKey::Week { week: 1, .. }) => Some(1),
        (PeriodKey::Week { week: prev, .. }, PeriodKey::Week { week: cur, .. }) => {
            Some(i64::from(cur) - i64::from(prev))
        }
        _ => None,
    }
}

/// Longest run in a set of annotated rows
pub fn longest_streak(records: &[StreakRecord]) -> Option<u32> {
    records.iter().map(|r| r.streak_count).max()
}
