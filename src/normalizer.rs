//! Check-off normalization
//!
//! This module turns joined check-offs into one row per habit and period.
//! - Filtered to a single periodicity bucket
//! - Keyed by calendar day (daily) or ISO week (weekly)
//! - Sorted by habit name first so runs never cross habit boundaries
//! - De-duplicated per (habit, period), keeping the earliest date

use tracing::debug;

use crate::error::StreakError;
use crate::types::{JoinedCheckOff, NormalizedCheckOff, PeriodKey, Periodicity};

/// Normalizer for building per-period rows from joined check-offs
pub struct Normalizer;

impl Normalizer {
    /// Normalize the check-offs of one periodicity bucket
    pub fn normalize(
        joined: &[JoinedCheckOff],
        periodicity: Periodicity,
    ) -> Result<Vec<NormalizedCheckOff>, StreakError> {
        let rows: Vec<NormalizedCheckOff> = joined
            .iter()
            .filter(|c| c.periodicity == periodicity)
            .map(|c| NormalizedCheckOff {
                habit_id: c.habit_id,
                name: c.name.clone(),
                periodicity,
                date: c.date,
                period: PeriodKey::for_date(c.date, periodicity),
            })
            .collect();

        if rows.is_empty() {
            return Err(StreakError::NoDataForPeriodicity(periodicity));
        }

        let rows = Self::canonicalize(rows);
        debug!(%periodicity, rows = rows.len(), "normalized check-offs");

        Ok(rows)
    }

    /// Sort by (name, period, date) and collapse rows sharing a (name, period).
    ///
    /// Applying this to its own output returns the same sequence.
    pub fn canonicalize(mut rows: Vec<NormalizedCheckOff>) -> Vec<NormalizedCheckOff> {
        rows.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then(a.period.cmp(&b.period))
                .then(a.date.cmp(&b.date))
        });
        rows.dedup_by(|later, earlier| later.name == earlier.name && later.period == earlier.period);
        rows
    }
}
