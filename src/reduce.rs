//! Streak reductions
//!
//! Extracts the longest streak from annotated buckets: for one habit, for one
//! periodicity, or across every periodicity. Every reduction returns all rows
//! that reach the maximum.

use crate::error::StreakError;
use crate::run_length::longest_streak;
use crate::types::{StreakRecord, StreakSummary};

/// Reducer over annotated streak records
pub struct Reducer;

impl Reducer {
    /// Rows of `name` that reach its longest streak.
    ///
    /// Ties are kept, so a habit that hit its best run twice is reported twice.
    pub fn max_for_habit(records: &[StreakRecord], name: &str) -> Result<Vec<StreakSummary>, StreakError> {
        let habit_rows: Vec<StreakRecord> = records.iter().filter(|r| r.name == name).cloned().collect();

        let max = longest_streak(&habit_rows).ok_or_else(|| StreakError::NoDataForHabit(name.to_string()))?;

        Ok(habit_rows
            .iter()
            .filter(|r| r.streak_count == max)
            .map(StreakRecord::summary)
            .collect())
    }

    /// Distinct rows of one periodicity bucket that reach the bucket's longest streak
    pub fn max_for_bucket(records: &[StreakRecord]) -> Vec<StreakSummary> {
        let Some(max) = longest_streak(records) else {
            return Vec::new();
        };

        distinct(
            records
                .iter()
                .filter(|r| r.streak_count == max)
                .map(StreakRecord::summary),
        )
    }

    /// Longest streak across several buckets, each row tagged with its periodicity.
    ///
    /// Empty buckets are skipped; if every bucket is empty the result is
    /// `NoTrackingData`.
    pub fn global_max<'a, I>(buckets: I) -> Result<Vec<StreakSummary>, StreakError>
    where
        I: IntoIterator<Item = &'a [StreakRecord]>,
    {
        let candidates: Vec<StreakSummary> = buckets
            .into_iter()
            .flat_map(Self::max_for_bucket)
            .collect();

        let max = candidates
            .iter()
            .map(|s| s.streak_count)
            .max()
            .ok_or(StreakError::NoTrackingData)?;

        Ok(candidates.into_iter().filter(|s| s.streak_count == max).collect())
    }
}

/// Drop repeated rows, keeping first-seen order
fn distinct(rows: impl Iterator<Item = StreakSummary>) -> Vec<StreakSummary> {
    let mut out: Vec<StreakSummary> = Vec::new();
    for row in rows {
        if !out.contains(&row) {
            out.push(row);
        }
    }
    out
}
