//! Check-off join
//!
//! Attaches the owning habit's name and periodicity to every check-off via an
//! equality join on habit id. Check-offs pointing at no known habit are dropped.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::StreakError;
use crate::types::{CheckOff, Habit, HabitId, JoinedCheckOff};

/// Joiner for enriching check-offs with habit attributes
pub struct Joiner;

impl Joiner {
    /// Join check-offs against the habit list.
    ///
    /// Fails with `NoTrackingData` when there are no check-offs at all and with
    /// `EmptyDataset` when check-offs exist but there are no habits to match.
    pub fn join(habits: &[Habit], check_offs: &[CheckOff]) -> Result<Vec<JoinedCheckOff>, StreakError> {
        if check_offs.is_empty() {
            return Err(StreakError::NoTrackingData);
        }
        if habits.is_empty() {
            return Err(StreakError::EmptyDataset);
        }

        let by_id: HashMap<HabitId, &Habit> = habits.iter().map(|h| (h.id, h)).collect();

        let joined: Vec<JoinedCheckOff> = check_offs
            .iter()
            .filter_map(|check_off| {
                by_id.get(&check_off.habit_id).map(|habit| JoinedCheckOff {
                    habit_id: habit.id,
                    name: habit.name.clone(),
                    periodicity: habit.periodicity,
                    date: check_off.date,
                })
            })
            .collect();

        let dropped = check_offs.len() - joined.len();
        if dropped > 0 {
            warn!(dropped, "dropping check-offs that reference unknown habits");
        }
        debug!(rows = joined.len(), "joined check-offs");

        Ok(joined)
    }
}
