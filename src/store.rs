//! Storage collaborator
//!
//! The engine reads habits and check-offs through [`TrackingSource`]. This
//! module also provides [`MemoryStore`], an in-memory store that allocates habit
//! ids at insert time and resolves names through an index.

use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::error::StoreError;
use crate::schema::{CheckOffRecord, Dataset};
use crate::types::{CheckOff, Habit, HabitId, Periodicity};

/// Snapshot provider consumed by the engine
pub trait TrackingSource {
    /// All habits, in no particular order
    fn habits(&self) -> Result<Vec<Habit>, StoreError>;

    /// All check-offs, in no particular order
    fn check_offs(&self) -> Result<Vec<CheckOff>, StoreError>;
}

/// In-memory habit and check-off store
#[derive(Debug, Clone)]
pub struct MemoryStore {
    habits: BTreeMap<HabitId, Habit>,
    by_name: HashMap<String, HabitId>,
    check_offs: Vec<CheckOff>,
    next_id: HabitId,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store; the first habit gets id 1
    pub fn new() -> Self {
        Self {
            habits: BTreeMap::new(),
            by_name: HashMap::new(),
            check_offs: Vec::new(),
            next_id: 1,
        }
    }

    /// Load a snapshot, rejecting duplicate ids or names and invalid dates
    pub fn from_dataset(dataset: &Dataset, today: NaiveDate) -> Result<Self, StoreError> {
        dataset.check_version()?;

        let mut store = Self::new();
        for habit in &dataset.habits {
            if store.habits.contains_key(&habit.id) {
                return Err(StoreError::DuplicateHabitId(habit.id));
            }
            if store.by_name.contains_key(&habit.name) {
                return Err(StoreError::DuplicateHabit(habit.name.clone()));
            }
            store.by_name.insert(habit.name.clone(), habit.id);
            store.habits.insert(habit.id, habit.clone());
            let after = habit
                .id
                .checked_add(1)
                .ok_or(StoreError::IdSpaceExhausted(habit.id))?;
            store.next_id = store.next_id.max(after);
        }
        store.check_offs = dataset.parse_check_offs(today)?;

        debug!(
            habits = store.habits.len(),
            check_offs = store.check_offs.len(),
            "loaded dataset"
        );
        Ok(store)
    }

    /// Export the store as a snapshot
    pub fn to_dataset(&self) -> Dataset {
        Dataset {
            habits: self.habits.values().cloned().collect(),
            check_offs: self.check_offs.iter().copied().map(CheckOffRecord::from).collect(),
            ..Dataset::default()
        }
    }

    /// Store a new habit and return its id
    pub fn add_habit(&mut self, name: &str, task: &str, periodicity: Periodicity) -> Result<HabitId, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidName);
        }
        if self.by_name.contains_key(name) {
            return Err(StoreError::DuplicateHabit(name.to_string()));
        }

        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(StoreError::IdSpaceExhausted(id))?;

        let now = Utc::now();
        self.habits.insert(
            id,
            Habit {
                id,
                name: name.to_string(),
                task: task.to_string(),
                periodicity,
                created_at: now,
                updated_at: now,
            },
        );
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    /// Resolve a habit name to its id
    pub fn habit_id(&self, name: &str) -> Result<HabitId, StoreError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| StoreError::HabitNotFound(name.to_string()))
    }

    /// Look up a habit by name
    pub fn habit(&self, name: &str) -> Result<&Habit, StoreError> {
        let id = self.habit_id(name)?;
        self.habits
            .get(&id)
            .ok_or_else(|| StoreError::HabitNotFound(name.to_string()))
    }

    fn habit_mut(&mut self, name: &str) -> Result<&mut Habit, StoreError> {
        let id = self.habit_id(name)?;
        self.habits
            .get_mut(&id)
            .ok_or_else(|| StoreError::HabitNotFound(name.to_string()))
    }

    pub fn update_task(&mut self, name: &str, task: &str) -> Result<(), StoreError> {
        let habit = self.habit_mut(name)?;
        habit.task = task.to_string();
        habit.updated_at = Utc::now();
        Ok(())
    }

    pub fn update_periodicity(&mut self, name: &str, periodicity: Periodicity) -> Result<(), StoreError> {
        let habit = self.habit_mut(name)?;
        habit.periodicity = periodicity;
        habit.updated_at = Utc::now();
        Ok(())
    }

    /// Update task and periodicity together
    pub fn update_habit(&mut self, name: &str, task: &str, periodicity: Periodicity) -> Result<(), StoreError> {
        let habit = self.habit_mut(name)?;
        habit.task = task.to_string();
        habit.periodicity = periodicity;
        habit.updated_at = Utc::now();
        Ok(())
    }

    /// Record a completion of the named habit
    pub fn check_off(&mut self, name: &str, date: NaiveDate) -> Result<(), StoreError> {
        let habit_id = self.habit_id(name)?;
        self.check_offs.push(CheckOff::new(habit_id, date));
        Ok(())
    }

    /// Remove every check-off of the named habit, returning how many were removed
    pub fn delete_check_offs(&mut self, name: &str) -> Result<usize, StoreError> {
        let habit_id = self.habit_id(name)?;
        let before = self.check_offs.len();
        self.check_offs.retain(|c| c.habit_id != habit_id);
        Ok(before - self.check_offs.len())
    }

    /// Remove the named habit together with its check-offs
    pub fn delete_habit(&mut self, name: &str) -> Result<(), StoreError> {
        self.delete_check_offs(name)?;
        if let Some(id) = self.by_name.remove(name) {
            self.habits.remove(&id);
        }
        Ok(())
    }

    /// Remove every habit and check-off; ids are not reused afterwards
    pub fn clear(&mut self) {
        self.habits.clear();
        self.by_name.clear();
        self.check_offs.clear();
    }

    /// Check-offs recorded for the named habit
    pub fn check_offs_for(&self, name: &str) -> Result<Vec<CheckOff>, StoreError> {
        let habit_id = self.habit_id(name)?;
        Ok(self
            .check_offs
            .iter()
            .filter(|c| c.habit_id == habit_id)
            .copied()
            .collect())
    }

    pub fn habit_count(&self) -> usize {
        self.habits.len()
    }

    pub fn check_off_count(&self) -> usize {
        self.check_offs.len()
    }
}

impl TrackingSource for MemoryStore {
    fn habits(&self) -> Result<Vec<Habit>, StoreError> {
        Ok(self.habits.values().cloned().collect())
    }

    fn check_offs(&self) -> Result<Vec<CheckOff>, StoreError> {
        Ok(self.check_offs.clone())
    }
}
