//! Habit catalog queries
//!
//! Listing and lookup over the habit list handed in by the storage collaborator.

use std::collections::HashMap;

use crate::error::StreakError;
use crate::types::{Habit, Periodicity};

/// Every habit in the snapshot
pub fn all_habits(habits: &[Habit]) -> Vec<&Habit> {
    habits.iter().collect()
}

/// Habits with the given periodicity, in input order
pub fn habits_with_periodicity(habits: &[Habit], periodicity: Periodicity) -> Vec<&Habit> {
    habits.iter().filter(|h| h.periodicity == periodicity).collect()
}

/// Name-keyed index over a habit list
pub struct HabitIndex<'a> {
    by_name: HashMap<&'a str, &'a Habit>,
}

impl<'a> HabitIndex<'a> {
    pub fn new(habits: &'a [Habit]) -> Self {
        Self {
            by_name: habits.iter().map(|h| (h.name.as_str(), h)).collect(),
        }
    }

    /// Look up a habit by its unique name
    pub fn get(&self, name: &str) -> Result<&'a Habit, StreakError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| StreakError::UnknownHabit(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }
}
