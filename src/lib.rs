//! Habit Streaks - Streak engine for a habit tracker
//!
//! Computes the longest run of consecutive completions from a snapshot of habits
//! and their check-offs, through a deterministic pipeline: join → normalization
//! → run-length encoding → reduction.
//!
//! ## Modules
//!
//! - **Engine**: `pipeline` answers streak queries over the whole dataset, one
//!   periodicity, or one habit
//! - **Storage**: `store` provides the `TrackingSource` seam and an in-memory store
//! - **Interop**: `report` encodes JSON reports; `ffi` exposes them over a C ABI

pub mod catalog;
pub mod config;
pub mod error;
pub mod join;
pub mod normalizer;
pub mod pipeline;
pub mod reduce;
pub mod report;
pub mod run_length;
pub mod schema;
pub mod store;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::StreakConfig;
pub use error::{StoreError, StreakError};
pub use pipeline::{
    max_streak, max_streak_for_habit, max_streak_for_periodicity, streak_report_json, StreakEngine, StreakQuery,
};
pub use store::{MemoryStore, TrackingSource};
pub use types::{CheckOff, Habit, HabitId, Periodicity, StreakRecord, StreakSummary, WeekAdjacency};

// Schema exports
pub use schema::{Dataset, DATASET_VERSION};

/// Library version embedded in all reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "habit-streaks";
