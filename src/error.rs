//! Error types for the streak engine

use thiserror::Error;

use crate::schema::ValidationError;
use crate::types::{HabitId, Periodicity};

/// Errors and no-data outcomes of a streak query
#[derive(Debug, Error)]
pub enum StreakError {
    #[error("There is currently no tracking data available")]
    NoTrackingData,

    #[error("There are currently no habits to match check-offs against")]
    EmptyDataset,

    #[error("There is currently no tracking data available for {0} habits")]
    NoDataForPeriodicity(Periodicity),

    #[error("There is no tracking data available for the habit {0}")]
    NoDataForHabit(String),

    #[error("Unknown habit: {0}")]
    UnknownHabit(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl StreakError {
    /// Whether this is an informational "nothing to show" outcome rather than a failure
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            StreakError::NoTrackingData
                | StreakError::EmptyDataset
                | StreakError::NoDataForPeriodicity(_)
                | StreakError::NoDataForHabit(_)
        )
    }
}

/// Errors raised by the storage collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Habit not found: {0}")]
    HabitNotFound(String),

    #[error("A habit named {0} already exists")]
    DuplicateHabit(String),

    #[error("Habit id {0} is used more than once")]
    DuplicateHabitId(HabitId),

    #[error("No habit id left after {0}")]
    IdSpaceExhausted(HabitId),

    #[error("Habit name must not be empty")]
    InvalidName,

    #[error("Invalid dataset: {0}")]
    Validation(#[from] ValidationError),
}
