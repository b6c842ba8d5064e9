//! habits.dataset.v1 schema definition
//!
//! A snapshot of everything the storage collaborator holds: the habit list and
//! the raw check-off log. Check-off dates stay as strings until validated.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::date::{validate_check_off_date, DATE_FORMAT};
use crate::types::{CheckOff, Habit, HabitId, Periodicity};

/// Current snapshot schema version
pub const DATASET_VERSION: &str = "habits.dataset.v1";

fn default_schema_version() -> String {
    DATASET_VERSION.to_string()
}

/// Raw check-off record as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOffRecord {
    /// Owning habit
    pub habit_id: HabitId,
    /// Check-off date (YYYY-MM-DD, time of day tolerated)
    pub date: String,
}

impl From<CheckOff> for CheckOffRecord {
    fn from(check_off: CheckOff) -> Self {
        Self {
            habit_id: check_off.habit_id,
            date: check_off.date.format(DATE_FORMAT).to_string(),
        }
    }
}

/// The habits.dataset.v1 snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Schema version identifier
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// Habit list
    #[serde(default)]
    pub habits: Vec<Habit>,
    /// Check-off log
    #[serde(default)]
    pub check_offs: Vec<CheckOffRecord>,
}

impl Default for Dataset {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            habits: Vec::new(),
            check_offs: Vec::new(),
        }
    }
}

impl Dataset {
    /// Parse a snapshot from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the snapshot as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check the schema version
    pub fn check_version(&self) -> Result<(), ValidationError> {
        if self.schema_version != DATASET_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: DATASET_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }
        Ok(())
    }

    /// Parse every check-off, stopping at the first malformed or future date
    pub fn parse_check_offs(&self, today: NaiveDate) -> Result<Vec<CheckOff>, ValidationError> {
        self.check_offs
            .iter()
            .map(|record| {
                validate_check_off_date(&record.date, today)
                    .map(|date| CheckOff::new(record.habit_id, date))
            })
            .collect()
    }

    /// Number of habits with the given periodicity
    pub fn count_with_periodicity(&self, periodicity: Periodicity) -> usize {
        self.habits
            .iter()
            .filter(|h| h.periodicity == periodicity)
            .count()
    }

    /// Collect every issue in the snapshot
    pub fn validate(&self, today: NaiveDate) -> Vec<DatasetIssue> {
        let mut issues = Vec::new();

        if let Err(error) = self.check_version() {
            issues.push(DatasetIssue {
                location: "schema_version".to_string(),
                error,
            });
        }

        let mut ids = HashSet::new();
        let mut names: HashMap<&str, usize> = HashMap::new();
        for (index, habit) in self.habits.iter().enumerate() {
            if !ids.insert(habit.id) {
                issues.push(DatasetIssue {
                    location: format!("habits[{index}]"),
                    error: ValidationError::DuplicateHabitId(habit.id),
                });
            }
            if names.insert(habit.name.as_str(), index).is_some() {
                issues.push(DatasetIssue {
                    location: format!("habits[{index}]"),
                    error: ValidationError::DuplicateHabitName(habit.name.clone()),
                });
            }
        }

        for (index, record) in self.check_offs.iter().enumerate() {
            let location = format!("check_offs[{index}]");
            if let Err(error) = validate_check_off_date(&record.date, today) {
                issues.push(DatasetIssue {
                    location: location.clone(),
                    error,
                });
            }
            if !ids.contains(&record.habit_id) {
                issues.push(DatasetIssue {
                    location,
                    error: ValidationError::UnknownHabitId(record.habit_id),
                });
            }
        }

        issues
    }
}

/// A single problem found in a snapshot
#[derive(Debug, Clone)]
pub struct DatasetIssue {
    /// JSON path of the offending entry
    pub location: String,
    pub error: ValidationError,
}

/// Validation errors for snapshots and check-off input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Invalid date {value:?}: {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("Check-off date {date} lies in the future (today is {today})")]
    FutureDate { date: NaiveDate, today: NaiveDate },

    #[error("Check-off references unknown habit id {0}")]
    UnknownHabitId(HabitId),

    #[error("Habit id {0} is used more than once")]
    DuplicateHabitId(HabitId),

    #[error("Habit name {0} is used more than once")]
    DuplicateHabitName(String),

    #[error("Invalid periodicity {0:?}: expected daily or weekly")]
    InvalidPeriodicity(String),
}
