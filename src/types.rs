//! Core types for the streak pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw habits and check-offs, joined check-offs, normalized period rows,
//! annotated streak records, and the summary rows handed to the presentation layer.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::schema::ValidationError;

/// Habit identifier assigned by the storage collaborator
pub type HabitId = i64;

/// Cadence at which a habit is expected to be completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Periodicity {
    Daily,
    Weekly,
}

impl Periodicity {
    /// Every periodicity, in the order buckets are reported
    pub const ALL: [Periodicity; 2] = [Periodicity::Daily, Periodicity::Weekly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Periodicity::Daily => "daily",
            Periodicity::Weekly => "weekly",
        }
    }
}

impl fmt::Display for Periodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Periodicity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Periodicity::Daily),
            "weekly" => Ok(Periodicity::Weekly),
            other => Err(ValidationError::InvalidPeriodicity(other.to_string())),
        }
    }
}

/// A habit as owned by the storage collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    /// Unique, stable identifier
    pub id: HabitId,
    /// Unique name, used as the external key
    pub name: String,
    /// Free-text task description
    #[serde(default)]
    pub task: String,
    /// Expected cadence
    pub periodicity: Periodicity,
    /// When the habit was created
    pub created_at: DateTime<Utc>,
    /// When the habit was last modified
    pub updated_at: DateTime<Utc>,
}

/// A single completion of a habit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckOff {
    pub habit_id: HabitId,
    pub date: NaiveDate,
}

impl CheckOff {
    pub fn new(habit_id: HabitId, date: NaiveDate) -> Self {
        Self { habit_id, date }
    }
}

/// Check-off enriched with the owning habit's name and periodicity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedCheckOff {
    pub habit_id: HabitId,
    pub name: String,
    pub periodicity: Periodicity,
    pub date: NaiveDate,
}

/// Canonical unit identifying which period a check-off belongs to.
///
/// The derived ordering is chronological within a variant. Day and week keys
/// never share a bucket, so cross-variant ordering carries no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKey {
    /// Calendar day
    Day(NaiveDate),
    /// ISO 8601 week (Monday start, week 1 holds the year's first Thursday)
    Week { year: i32, week: u32 },
}

impl PeriodKey {
    /// Period key of `date` under the given periodicity
    pub fn for_date(date: NaiveDate, periodicity: Periodicity) -> Self {
        match periodicity {
            Periodicity::Daily => PeriodKey::Day(date),
            Periodicity::Weekly => {
                let iso = date.iso_week();
                PeriodKey::Week {
                    year: iso.year(),
                    week: iso.week(),
                }
            }
        }
    }

    /// First calendar day of the period
    pub fn start_date(&self) -> Option<NaiveDate> {
        match *self {
            PeriodKey::Day(date) => Some(date),
            PeriodKey::Week { year, week } => NaiveDate::from_isoywd_opt(year, week, Weekday::Mon),
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKey::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            PeriodKey::Week { year, week } => write!(f, "{year}-W{week:02}"),
        }
    }
}

/// How consecutive weekly periods are recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekAdjacency {
    /// Weeks are adjacent when their Mondays are exactly seven days apart
    #[default]
    Calendar,
    /// Raw ISO week-number difference; only week 52 followed by week 1 wraps
    WeekNumber,
}

/// Check-off reduced to one row per (habit, period)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedCheckOff {
    pub habit_id: HabitId,
    pub name: String,
    pub periodicity: Periodicity,
    /// Earliest check-off date inside the period
    pub date: NaiveDate,
    pub period: PeriodKey,
}

/// Normalized row annotated with its running streak
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    pub habit_id: HabitId,
    pub name: String,
    pub periodicity: Periodicity,
    pub date: NaiveDate,
    pub period: PeriodKey,
    /// Distance in periods to the previous row of the same habit
    pub gap: Option<i64>,
    /// True when this row starts a new run
    pub is_break: bool,
    /// Position inside the current run, 0 on the break row
    pub streak_helper: u32,
    /// Length of the uninterrupted run ending at this row
    pub streak_count: u32,
}

impl StreakRecord {
    /// Drop bookkeeping columns
    pub fn summary(&self) -> StreakSummary {
        StreakSummary {
            name: self.name.clone(),
            periodicity: self.periodicity,
            streak_count: self.streak_count,
        }
    }
}

/// Result row handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreakSummary {
    pub name: String,
    pub periodicity: Periodicity,
    pub streak_count: u32,
}
