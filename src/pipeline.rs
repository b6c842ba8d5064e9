//! Pipeline orchestration
//!
//! This module provides the public API of the streak engine.
//! It runs the full pipeline from raw habits and check-offs to summary rows.
//!
//! Pipeline stages:
//! 1. Joiner - Attach habit name and periodicity to each check-off
//! 2. Normalizer - Filter by periodicity, sort, collapse per period
//! 3. RunLengthEncoder - Annotate running streak counts
//! 4. Reducer - Extract the longest streak

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::catalog::HabitIndex;
use crate::config::StreakConfig;
use crate::error::StreakError;
use crate::join::Joiner;
use crate::normalizer::Normalizer;
use crate::reduce::Reducer;
use crate::report::{ReportEncoder, StreakReport};
use crate::run_length::RunLengthEncoder;
use crate::schema::Dataset;
use crate::store::{MemoryStore, TrackingSource};
use crate::types::{CheckOff, Habit, JoinedCheckOff, Periodicity, StreakRecord, StreakSummary};

/// What a streak query asks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StreakQuery {
    /// Longest streak over every habit
    All,
    /// Longest streak among habits of one periodicity
    Periodicity(Periodicity),
    /// Longest streak of one named habit
    Habit(String),
}

impl fmt::Display for StreakQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreakQuery::All => f.write_str("all"),
            StreakQuery::Periodicity(p) => write!(f, "periodicity:{p}"),
            StreakQuery::Habit(name) => write!(f, "habit:{name}"),
        }
    }
}

/// Streak engine.
///
/// Holds configuration only; every query recomputes from the inputs it is given.
#[derive(Debug, Clone, Default)]
pub struct StreakEngine {
    config: StreakConfig,
}

impl StreakEngine {
    /// Create an engine with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StreakConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StreakConfig {
        &self.config
    }

    /// Per-check-off streak annotations for one periodicity bucket
    pub fn annotate(
        &self,
        habits: &[Habit],
        check_offs: &[CheckOff],
        periodicity: Periodicity,
    ) -> Result<Vec<StreakRecord>, StreakError> {
        let joined = Joiner::join(habits, check_offs)?;
        self.annotate_joined(&joined, periodicity)
    }

    fn annotate_joined(
        &self,
        joined: &[JoinedCheckOff],
        periodicity: Periodicity,
    ) -> Result<Vec<StreakRecord>, StreakError> {
        let rows = Normalizer::normalize(joined, periodicity)?;
        Ok(RunLengthEncoder::new(self.config.week_adjacency).encode(rows))
    }

    /// Habit(s) with the longest streak across both periodicities
    pub fn max_streak(&self, habits: &[Habit], check_offs: &[CheckOff]) -> Result<Vec<StreakSummary>, StreakError> {
        let joined = Joiner::join(habits, check_offs)?;

        let mut buckets = Vec::with_capacity(Periodicity::ALL.len());
        for periodicity in Periodicity::ALL {
            match self.annotate_joined(&joined, periodicity) {
                Ok(records) => buckets.push(records),
                Err(StreakError::NoDataForPeriodicity(_)) => {
                    debug!(%periodicity, "no check-offs in bucket");
                }
                Err(e) => return Err(e),
            }
        }

        Reducer::global_max(buckets.iter().map(Vec::as_slice))
    }

    /// Habit(s) with the longest streak within one periodicity
    pub fn max_streak_for_periodicity(
        &self,
        habits: &[Habit],
        check_offs: &[CheckOff],
        periodicity: Periodicity,
    ) -> Result<Vec<StreakSummary>, StreakError> {
        let records = self.annotate(habits, check_offs, periodicity)?;
        Ok(Reducer::max_for_bucket(&records))
    }

    /// Longest streak of the named habit.
    ///
    /// The name must belong to `habits`; an unknown name is `UnknownHabit`.
    pub fn max_streak_for_habit(
        &self,
        habits: &[Habit],
        check_offs: &[CheckOff],
        name: &str,
    ) -> Result<Vec<StreakSummary>, StreakError> {
        if check_offs.is_empty() {
            return Err(StreakError::NoTrackingData);
        }

        let habit = HabitIndex::new(habits).get(name)?;
        if !check_offs.iter().any(|c| c.habit_id == habit.id) {
            return Err(StreakError::NoDataForHabit(name.to_string()));
        }

        let records = self.annotate(habits, check_offs, habit.periodicity)?;
        Reducer::max_for_habit(&records, name)
    }

    /// Dispatch a query against in-memory inputs
    pub fn query(
        &self,
        habits: &[Habit],
        check_offs: &[CheckOff],
        query: &StreakQuery,
    ) -> Result<Vec<StreakSummary>, StreakError> {
        debug!(%query, habits = habits.len(), check_offs = check_offs.len(), "running streak query");
        match query {
            StreakQuery::All => self.max_streak(habits, check_offs),
            StreakQuery::Periodicity(p) => self.max_streak_for_periodicity(habits, check_offs, *p),
            StreakQuery::Habit(name) => self.max_streak_for_habit(habits, check_offs, name),
        }
    }

    /// Take a snapshot from the storage collaborator and dispatch a query
    pub fn run(&self, source: &dyn TrackingSource, query: &StreakQuery) -> Result<Vec<StreakSummary>, StreakError> {
        let habits = source.habits()?;
        let check_offs = source.check_offs()?;
        self.query(&habits, &check_offs, query)
    }

    /// Run a query and encode the outcome as a report
    pub fn report(
        &self,
        source: &dyn TrackingSource,
        query: &StreakQuery,
        encoder: &ReportEncoder,
    ) -> Result<StreakReport, StreakError> {
        encoder.encode(query, self.run(source, query))
    }
}

/// Habit(s) with the longest streak, using default settings
pub fn max_streak(habits: &[Habit], check_offs: &[CheckOff]) -> Result<Vec<StreakSummary>, StreakError> {
    StreakEngine::new().max_streak(habits, check_offs)
}

/// Habit(s) with the longest streak within one periodicity, using default settings
pub fn max_streak_for_periodicity(
    habits: &[Habit],
    check_offs: &[CheckOff],
    periodicity: Periodicity,
) -> Result<Vec<StreakSummary>, StreakError> {
    StreakEngine::new().max_streak_for_periodicity(habits, check_offs, periodicity)
}

/// Longest streak of the named habit, using default settings
pub fn max_streak_for_habit(
    habits: &[Habit],
    check_offs: &[CheckOff],
    name: &str,
) -> Result<Vec<StreakSummary>, StreakError> {
    StreakEngine::new().max_streak_for_habit(habits, check_offs, name)
}

/// Convert a habits.dataset.v1 JSON snapshot into a JSON streak report.
///
/// # Arguments
/// * `dataset_json` - Snapshot of habits and check-offs
/// * `query` - What to compute
/// * `today` - Reference date; check-offs after it are rejected
///
/// # Example
/// ```ignore
/// let report = streak_report_json(dataset_json, &StreakQuery::All, today)?;
/// ```
pub fn streak_report_json(dataset_json: &str, query: &StreakQuery, today: NaiveDate) -> Result<String, StreakError> {
    let dataset = Dataset::from_json(dataset_json)?;
    let store = MemoryStore::from_dataset(&dataset, today)?;
    ReportEncoder::new().encode_to_json(query, StreakEngine::new().run(&store, query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportStatus;
    use crate::types::{HabitId, WeekAdjacency};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d").unwrap()
    }

    fn habit(id: HabitId, name: &str, periodicity: Periodicity) -> Habit {
        let now = Utc::now();
        Habit {
            id,
            name: name.to_string(),
            task: String::new(),
            periodicity,
            created_at: now,
            updated_at: now,
        }
    }

    fn summary(name: &str, periodicity: Periodicity, streak_count: u32) -> StreakSummary {
        StreakSummary {
            name: name.to_string(),
            periodicity,
            streak_count,
        }
    }

    fn reference_habits() -> Vec<Habit> {
        vec![
            habit(1, "Studying", Periodicity::Weekly),
            habit(2, "Jogging", Periodicity::Weekly),
            habit(3, "Cleaning", Periodicity::Weekly),
            habit(4, "Waking up", Periodicity::Daily),
            habit(5, "Doing Workout", Periodicity::Daily),
        ]
    }

    fn reference_check_offs() -> Vec<CheckOff> {
        [
            (1, "2021-11-01 06:23"), (2, "2021-11-01 06:31"), (3, "2021-11-01 08:14"),
            (4, "2021-11-03 19:27"), (5, "2021-11-15 21:56"), (1, "2021-11-06 21:45"),
            (1, "2021-11-11 19:34"), (1, "2021-11-21 15:32"), (1, "2021-11-22 12:01"),
            (2, "2021-11-07 12:21"), (2, "2021-11-19 20:15"), (2, "2021-11-21 08:24"),
            (3, "2021-11-06 16:45"), (3, "2021-11-12 18:41"), (3, "2021-11-22 07:34"),
            (3, "2021-11-27 16:32"), (4, "2021-11-02 05:04"), (4, "2021-11-03 05:21"),
            (4, "2021-11-04 11:41"), (4, "2021-11-05 05:02"), (4, "2021-11-06 12:21"),
            (4, "2021-11-07 16:56"), (4, "2021-11-08 05:21"), (4, "2021-11-12 13:34"),
            (4, "2021-11-13 06:03"), (4, "2021-11-17 07:21"), (4, "2021-11-21 21:45"),
            (5, "2021-11-02 06:21"), (5, "2021-11-03 19:28"), (5, "2021-11-04 11:42"),
            (5, "2021-11-05 19:41"), (5, "2021-11-06 12:21"), (5, "2021-11-08 11:31"),
            (5, "2021-11-09 07:21"), (5, "2021-11-10 07:32"), (5, "2021-11-11 19:45"),
            (5, "2021-11-12 17:34"), (5, "2021-11-13 06:57"), (5, "2021-11-14 09:09"),
            (5, "2021-11-15 15:32"), (5, "2021-11-16 13:21"), (5, "2021-11-17 08:21"),
            (5, "2021-11-18 08:22"), (5, "2021-11-19 08:34"), (5, "2021-11-20 12:01"),
            (5, "2021-11-25 09:21"), (5, "2021-11-26 08:23"), (5, "2021-11-27 07:35"),
            (5, "2021-11-30 08:21"), (4, "2021-11-22 08:45"), (4, "2021-11-23 09:00"),
            (4, "2021-11-28 21:00"),
        ]
        .into_iter()
        .map(|(id, when)| CheckOff::new(id, date(when)))
        .collect()
    }

    #[test]
    fn test_reference_dataset_global_max() {
        let rows = max_streak(&reference_habits(), &reference_check_offs()).unwrap();
        assert_eq!(rows, vec![summary("Doing Workout", Periodicity::Daily, 13)]);
    }

    #[test]
    fn test_reference_dataset_per_habit() {
        let habits = reference_habits();
        let check_offs = reference_check_offs();

        assert_eq!(
            max_streak_for_habit(&habits, &check_offs, "Waking up").unwrap(),
            vec![summary("Waking up", Periodicity::Daily, 7)]
        );
        assert_eq!(
            max_streak_for_habit(&habits, &check_offs, "Studying").unwrap(),
            vec![summary("Studying", Periodicity::Weekly, 4)]
        );
        assert_eq!(
            max_streak_for_habit(&habits, &check_offs, "Cleaning").unwrap(),
            vec![summary("Cleaning", Periodicity::Weekly, 2)]
        );
        // Jogging never managed two weeks in a row, so both weeks tie at 1
        assert_eq!(
            max_streak_for_habit(&habits, &check_offs, "Jogging").unwrap(),
            vec![
                summary("Jogging", Periodicity::Weekly, 1),
                summary("Jogging", Periodicity::Weekly, 1),
            ]
        );
    }

    #[test]
    fn test_reference_dataset_per_periodicity() {
        let habits = reference_habits();
        let check_offs = reference_check_offs();

        assert_eq!(
            max_streak_for_periodicity(&habits, &check_offs, Periodicity::Weekly).unwrap(),
            vec![summary("Studying", Periodicity::Weekly, 4)]
        );
        assert_eq!(
            max_streak_for_periodicity(&habits, &check_offs, Periodicity::Daily).unwrap(),
            vec![summary("Doing Workout", Periodicity::Daily, 13)]
        );
    }

    #[test]
    fn test_annotations_for_daily_bucket() {
        let records = StreakEngine::new()
            .annotate(&reference_habits(), &reference_check_offs(), Periodicity::Daily)
            .unwrap();

        let waking: Vec<u32> = records
            .iter()
            .filter(|r| r.name == "Waking up")
            .map(|r| r.streak_count)
            .collect();
        assert_eq!(waking, vec![1, 2, 3, 4, 5, 6, 7, 1, 2, 1, 1, 2, 3, 1]);
        assert!(records.iter().all(|r| r.periodicity == Periodicity::Daily));
    }

    #[test]
    fn test_isolated_check_offs() {
        let habits = vec![habit(4, "Waking up", Periodicity::Daily)];
        let check_offs: Vec<CheckOff> = ["2021-11-01", "2021-11-03", "2021-11-15"]
            .into_iter()
            .map(|d| CheckOff::new(4, date(d)))
            .collect();

        let records = StreakEngine::new().annotate(&habits, &check_offs, Periodicity::Daily).unwrap();
        assert!(records.iter().all(|r| r.streak_count == 1));
        assert_eq!(max_streak_for_habit(&habits, &check_offs, "Waking up").unwrap().len(), 3);
    }

    #[test]
    fn test_daily_beats_weekly() {
        let habits = vec![
            habit(1, "Waking up", Periodicity::Daily),
            habit(2, "Studying", Periodicity::Weekly),
        ];
        let mut check_offs: Vec<CheckOff> = (2..=8)
            .map(|day| CheckOff::new(1, NaiveDate::from_ymd_opt(2021, 11, day).unwrap()))
            .collect();
        check_offs.extend(
            ["2021-11-01", "2021-11-08", "2021-11-15", "2021-11-22"]
                .into_iter()
                .map(|d| CheckOff::new(2, date(d))),
        );

        let rows = max_streak(&habits, &check_offs).unwrap();
        assert_eq!(rows, vec![summary("Waking up", Periodicity::Daily, 7)]);
    }

    #[test]
    fn test_weekly_wraparound_end_to_end() {
        let habits = vec![habit(1, "Jogging", Periodicity::Weekly)];
        let check_offs = vec![
            CheckOff::new(1, date("2021-12-29")),
            CheckOff::new(1, date("2022-01-05")),
        ];

        for adjacency in [WeekAdjacency::Calendar, WeekAdjacency::WeekNumber] {
            let engine = StreakEngine::with_config(StreakConfig::default().with_week_adjacency(adjacency));
            let rows = engine.max_streak_for_habit(&habits, &check_offs, "Jogging").unwrap();
            assert_eq!(rows, vec![summary("Jogging", Periodicity::Weekly, 2)], "{adjacency:?}");
        }
    }

    #[test]
    fn test_empty_check_offs_everywhere() {
        let habits = reference_habits();
        let engine = StreakEngine::new();
        let queries = [
            StreakQuery::All,
            StreakQuery::Periodicity(Periodicity::Daily),
            StreakQuery::Periodicity(Periodicity::Weekly),
            StreakQuery::Habit("Jogging".to_string()),
        ];

        for query in &queries {
            let result = engine.query(&habits, &[], query);
            assert!(matches!(result, Err(StreakError::NoTrackingData)), "{query}");
        }
    }

    #[test]
    fn test_missing_bucket_does_not_hide_other() {
        let habits = reference_habits();
        let weekly_only: Vec<CheckOff> = reference_check_offs()
            .into_iter()
            .filter(|c| c.habit_id <= 3)
            .collect();

        assert_eq!(
            max_streak(&habits, &weekly_only).unwrap(),
            vec![summary("Studying", Periodicity::Weekly, 4)]
        );
        assert!(matches!(
            max_streak_for_periodicity(&habits, &weekly_only, Periodicity::Daily),
            Err(StreakError::NoDataForPeriodicity(Periodicity::Daily))
        ));
    }

    #[test]
    fn test_habit_without_check_offs() {
        let mut habits = reference_habits();
        habits.push(habit(6, "Do meditation", Periodicity::Daily));

        let result = max_streak_for_habit(&habits, &reference_check_offs(), "Do meditation");
        assert!(matches!(result, Err(StreakError::NoDataForHabit(ref name)) if name == "Do meditation"));

        let result = max_streak_for_habit(&habits, &reference_check_offs(), "Swimming");
        assert!(matches!(result, Err(StreakError::UnknownHabit(_))));
    }

    #[test]
    fn test_run_against_memory_store() {
        let mut store = MemoryStore::new();
        store.add_habit("Waking up", "Wake up at 5am", Periodicity::Daily).unwrap();
        for day in ["2021-11-02", "2021-11-03", "2021-11-03", "2021-11-04"] {
            store.check_off("Waking up", date(day)).unwrap();
        }

        let engine = StreakEngine::new();
        assert_eq!(
            engine.run(&store, &StreakQuery::All).unwrap(),
            vec![summary("Waking up", Periodicity::Daily, 3)]
        );

        let report = engine.report(&store, &StreakQuery::Periodicity(Periodicity::Weekly), &ReportEncoder::new()).unwrap();
        assert_eq!(report.status, ReportStatus::NoData);
        assert_eq!(report.query, "periodicity:weekly");
    }

    #[test]
    fn test_streak_report_json() {
        let json = r#"{
            "schema_version": "habits.dataset.v1",
            "habits": [{
                "id": 1, "name": "Studying", "task": "", "periodicity": "weekly",
                "created_at": "2021-11-01T06:00:00Z", "updated_at": "2021-11-01T06:00:00Z"
            }],
            "check_offs": [
                { "habit_id": 1, "date": "2021-11-01" },
                { "habit_id": 1, "date": "2021-11-11" }
            ]
        }"#;

        let report = streak_report_json(json, &StreakQuery::All, date("2021-12-01")).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&report).unwrap();
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["rows"][0]["name"], "Studying");
        assert_eq!(payload["rows"][0]["streak_count"], 2);

        let err = streak_report_json("not json", &StreakQuery::All, date("2021-12-01")).unwrap_err();
        assert!(matches!(err, StreakError::Json(_)));
    }

    #[test]
    fn test_query_display() {
        assert_eq!(StreakQuery::All.to_string(), "all");
        assert_eq!(StreakQuery::Periodicity(Periodicity::Daily).to_string(), "periodicity:daily");
        assert_eq!(StreakQuery::Habit("Jogging".to_string()).to_string(), "habit:Jogging");
    }
}
