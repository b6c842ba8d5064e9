//! Streaks CLI - Command-line interface for the habit streak engine
//!
//! Commands:
//! - streak: Longest streak overall, per periodicity, or per habit
//! - annotate: Print per-period streak annotations
//! - habits: List habits
//! - add / check-off / update / reset / delete: Manage the dataset file
//! - validate: Validate the dataset file
//! - doctor: Diagnose configuration and dataset health

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use habit_streaks::catalog::{all_habits, habits_with_periodicity, HabitIndex};
use habit_streaks::report::{ReportEncoder, ReportStatus};
use habit_streaks::schema::{local_today, validate_check_off_date, Dataset, ValidationError, DATASET_VERSION};
use habit_streaks::{
    MemoryStore, Periodicity, StoreError, StreakConfig, StreakEngine, StreakError, StreakQuery, TrackingSource,
    WeekAdjacency, PRODUCER_NAME, VERSION,
};

/// Streaks - Habit tracking with streak analysis
#[derive(Parser)]
#[command(name = "streaks")]
#[command(version = VERSION)]
#[command(about = "Track habits and compute their longest streaks", long_about = None)]
struct Cli {
    /// Dataset file (habits.dataset.v1); a missing file is an empty dataset
    #[arg(long, global = true, default_value = "habits.json")]
    data: PathBuf,

    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Rule for deciding whether two weeks are consecutive
    #[arg(long, global = true, value_enum)]
    week_adjacency: Option<AdjacencyArg>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Longest streak overall, for one periodicity, or for one habit
    Streak {
        /// Restrict to habits of this periodicity
        #[arg(long, value_enum, conflicts_with = "habit")]
        periodicity: Option<PeriodicityArg>,

        /// Restrict to this habit
        #[arg(long)]
        habit: Option<String>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print per-period streak annotations for one periodicity
    Annotate {
        #[arg(long, value_enum)]
        periodicity: PeriodicityArg,

        /// Only show rows of this habit
        #[arg(long)]
        habit: Option<String>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// List habits
    Habits {
        /// Only list habits of this periodicity
        #[arg(long, value_enum)]
        periodicity: Option<PeriodicityArg>,
    },

    /// Create a new habit
    Add {
        #[arg(long)]
        name: String,

        /// Free-text task description
        #[arg(long, default_value = "")]
        task: String,

        #[arg(long, value_enum)]
        periodicity: PeriodicityArg,
    },

    /// Record a completion
    CheckOff {
        #[arg(long)]
        name: String,

        /// Completion date (YYYY-MM-DD or YYYY-MM-DD hh:mm); defaults to today
        #[arg(long)]
        date: Option<String>,
    },

    /// Change a habit's task and/or periodicity
    Update {
        #[arg(long)]
        name: String,

        #[arg(long)]
        task: Option<String>,

        #[arg(long, value_enum)]
        periodicity: Option<PeriodicityArg>,

        /// Also delete the habit's existing check-offs
        #[arg(long)]
        reset_check_offs: bool,
    },

    /// Delete every check-off of a habit
    Reset {
        #[arg(long)]
        name: String,
    },

    /// Delete one habit, or all habits, together with their check-offs
    Delete {
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        name: Option<String>,

        #[arg(long)]
        all: bool,
    },

    /// Validate the dataset file
    Validate {
        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and dataset health
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PeriodicityArg {
    Daily,
    Weekly,
}

impl From<PeriodicityArg> for Periodicity {
    fn from(arg: PeriodicityArg) -> Self {
        match arg {
            PeriodicityArg::Daily => Periodicity::Daily,
            PeriodicityArg::Weekly => Periodicity::Weekly,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum AdjacencyArg {
    /// Compare ISO weeks chronologically
    Calendar,
    /// Subtract raw week numbers (52 -> 1 counts as consecutive)
    WeekNumber,
}

impl From<AdjacencyArg> for WeekAdjacency {
    fn from(arg: AdjacencyArg) -> Self {
        match arg {
            AdjacencyArg::Calendar => WeekAdjacency::Calendar,
            AdjacencyArg::WeekNumber => WeekAdjacency::WeekNumber,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable lines
    Text,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), StreaksCliError> {
    let today = local_today();
    let config = load_config(cli.config.as_deref(), cli.week_adjacency)?;
    let data = cli.data.as_path();

    match cli.command {
        Commands::Streak {
            periodicity,
            habit,
            format,
        } => {
            let query = match (periodicity, habit) {
                (Some(p), _) => StreakQuery::Periodicity(p.into()),
                (None, Some(name)) => StreakQuery::Habit(name),
                (None, None) => StreakQuery::All,
            };
            cmd_streak(data, config, &query, format, today)
        }
        Commands::Annotate {
            periodicity,
            habit,
            format,
        } => cmd_annotate(data, config, periodicity.into(), habit.as_deref(), format, today),
        Commands::Habits { periodicity } => cmd_habits(data, periodicity.map(Periodicity::from), today),
        Commands::Add {
            name,
            task,
            periodicity,
        } => {
            let mut store = load_store(data, today)?;
            store.add_habit(&name, &task, periodicity.into())?;
            save_store(data, &store)?;
            println!("Habit {} successfully created.", name.trim());
            Ok(())
        }
        Commands::CheckOff { name, date } => {
            let date = match date {
                Some(value) => validate_check_off_date(&value, today)?,
                None => today,
            };
            let mut store = load_store(data, today)?;
            store.check_off(&name, date)?;
            save_store(data, &store)?;
            println!("Habit {name} successfully checked-off.");
            Ok(())
        }
        Commands::Update {
            name,
            task,
            periodicity,
            reset_check_offs,
        } => cmd_update(data, &name, task.as_deref(), periodicity.map(Periodicity::from), reset_check_offs, today),
        Commands::Reset { name } => {
            let mut store = load_store(data, today)?;
            let removed = store.delete_check_offs(&name)?;
            save_store(data, &store)?;
            println!("Removed {removed} check-offs of habit {name}.");
            Ok(())
        }
        Commands::Delete { name, all } => {
            let mut store = load_store(data, today)?;
            match name {
                Some(name) if !all => {
                    store.delete_habit(&name)?;
                    println!("Habit {name} successfully deleted.");
                }
                _ => {
                    store.clear();
                    println!("All habits successfully deleted.");
                }
            }
            save_store(data, &store)
        }
        Commands::Validate { json } => cmd_validate(data, json, today),
        Commands::Doctor { json } => cmd_doctor(data, cli.config.as_deref(), config, json, today),
    }
}

fn cmd_streak(
    data: &Path,
    config: StreakConfig,
    query: &StreakQuery,
    format: OutputFormat,
    today: NaiveDate,
) -> Result<(), StreaksCliError> {
    let store = load_store(data, today)?;
    let report = StreakEngine::with_config(config).report(&store, query, &ReportEncoder::new())?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&report)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => match report.status {
            ReportStatus::NoData => println!("{}", report.message.unwrap_or_default()),
            ReportStatus::Ok => {
                println!("Longest streak ({query}):");
                for row in &report.rows {
                    println!("  {} [{}]: {} in a row", row.name, row.periodicity, row.streak_count);
                }
            }
        },
    }

    Ok(())
}

fn cmd_annotate(
    data: &Path,
    config: StreakConfig,
    periodicity: Periodicity,
    habit: Option<&str>,
    format: OutputFormat,
    today: NaiveDate,
) -> Result<(), StreaksCliError> {
    let store = load_store(data, today)?;
    let habits = store.habits()?;
    let check_offs = store.check_offs()?;

    if let Some(name) = habit {
        if !HabitIndex::new(&habits).contains(name) {
            return Err(StreakError::UnknownHabit(name.to_string()).into());
        }
    }

    let records = match StreakEngine::with_config(config).annotate(&habits, &check_offs, periodicity) {
        Ok(records) => records,
        Err(e) if e.is_no_data() => {
            println!("{e}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let records: Vec<_> = records
        .into_iter()
        .filter(|r| habit.map_or(true, |name| r.name == name))
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&records)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Text => {
            println!("{:<24} {:<10} {:<10} {:>5} {:>7}", "habit", "period", "date", "gap", "streak");
            for r in &records {
                let gap = r.gap.map(|g| g.to_string()).unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<24} {:<10} {:<10} {:>5} {:>7}",
                    r.name,
                    r.period.to_string(),
                    r.date.to_string(),
                    gap,
                    r.streak_count
                );
            }
        }
    }

    Ok(())
}

fn cmd_habits(data: &Path, periodicity: Option<Periodicity>, today: NaiveDate) -> Result<(), StreaksCliError> {
    let store = load_store(data, today)?;
    let habits = store.habits()?;

    let listed = match periodicity {
        Some(p) => habits_with_periodicity(&habits, p),
        None => all_habits(&habits),
    };

    if listed.is_empty() {
        println!("There are currently no habits defined");
        return Ok(());
    }

    println!("{:<4} {:<24} {:<8} {:>10} task", "id", "name", "period", "check-offs");
    for habit in listed {
        let tracked = store.check_offs_for(&habit.name)?.len();
        println!(
            "{:<4} {:<24} {:<8} {:>10} {}",
            habit.id,
            habit.name,
            habit.periodicity.as_str(),
            tracked,
            habit.task
        );
    }
    Ok(())
}

fn cmd_update(
    data: &Path,
    name: &str,
    task: Option<&str>,
    periodicity: Option<Periodicity>,
    reset_check_offs: bool,
    today: NaiveDate,
) -> Result<(), StreaksCliError> {
    if task.is_none() && periodicity.is_none() && !reset_check_offs {
        return Err(StreaksCliError::NothingToUpdate);
    }

    let mut store = load_store(data, today)?;
    match (task, periodicity) {
        (Some(task), Some(p)) => store.update_habit(name, task, p)?,
        (Some(task), None) => store.update_task(name, task)?,
        (None, Some(p)) => store.update_periodicity(name, p)?,
        (None, None) => {}
    }
    if reset_check_offs {
        let removed = store.delete_check_offs(name)?;
        info!(removed, habit = name, "deleted check-offs");
    }
    save_store(data, &store)?;

    println!("Habit {name} successfully modified.");
    Ok(())
}

fn cmd_validate(data: &Path, json: bool, today: NaiveDate) -> Result<(), StreaksCliError> {
    let dataset = load_dataset(data)?;
    let issues = dataset.validate(today);

    let report = ValidationReport {
        schema_version: dataset.schema_version.clone(),
        total_habits: dataset.habits.len(),
        total_check_offs: dataset.check_offs.len(),
        invalid_entries: issues.len(),
        errors: issues
            .iter()
            .map(|issue| ValidationErrorDetail {
                location: issue.location.clone(),
                error: issue.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Schema:          {}", report.schema_version);
        println!("Habits:          {}", report.total_habits);
        println!("Check-offs:      {}", report.total_check_offs);
        println!("Invalid entries: {}", report.invalid_entries);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - {}: {}", err.location, err.error);
            }
        }
    }

    if report.invalid_entries > 0 {
        Err(StreaksCliError::ValidationFailed(report.invalid_entries))
    } else {
        Ok(())
    }
}

fn cmd_doctor(
    data: &Path,
    config_path: Option<&Path>,
    config: StreakConfig,
    json: bool,
    today: NaiveDate,
) -> Result<(), StreaksCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{PRODUCER_NAME} version {VERSION}"),
    });

    checks.push(DoctorCheck {
        name: "config".to_string(),
        status: CheckStatus::Ok,
        message: match config_path {
            Some(path) => format!("Loaded {} (week adjacency: {:?})", path.display(), config.week_adjacency),
            None => format!("Defaults (week adjacency: {:?})", config.week_adjacency),
        },
    });

    let dataset_check = if !data.exists() {
        DoctorCheck {
            name: "dataset".to_string(),
            status: CheckStatus::Warning,
            message: format!("{} does not exist yet; it is created on the first change", data.display()),
        }
    } else {
        match load_dataset(data) {
            Ok(dataset) => {
                let issues = dataset.validate(today);
                if issues.is_empty() {
                    DoctorCheck {
                        name: "dataset".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "{} valid ({} habits: {} daily, {} weekly; {} check-offs)",
                            DATASET_VERSION,
                            dataset.habits.len(),
                            dataset.count_with_periodicity(Periodicity::Daily),
                            dataset.count_with_periodicity(Periodicity::Weekly),
                            dataset.check_offs.len()
                        ),
                    }
                } else {
                    DoctorCheck {
                        name: "dataset".to_string(),
                        status: CheckStatus::Error,
                        message: format!("{} invalid entries; run 'streaks validate' for details", issues.len()),
                    }
                }
            }
            Err(e) => DoctorCheck {
                name: "dataset".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot load dataset: {}", CliError::from(e).message),
            },
        }
    };
    checks.push(dataset_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Streaks Doctor Report");
        println!("=====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(StreaksCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn load_config(path: Option<&Path>, week_adjacency: Option<AdjacencyArg>) -> Result<StreakConfig, StreaksCliError> {
    let mut config = match path {
        Some(path) => StreakConfig::from_json(&fs::read_to_string(path)?)?,
        None => StreakConfig::default(),
    };
    if let Some(adjacency) = week_adjacency {
        config = config.with_week_adjacency(adjacency.into());
    }
    debug!(?config, "resolved configuration");
    Ok(config)
}

fn load_dataset(path: &Path) -> Result<Dataset, StreaksCliError> {
    if !path.exists() {
        debug!(path = %path.display(), "dataset file missing, starting empty");
        return Ok(Dataset::default());
    }
    Ok(Dataset::from_json(&fs::read_to_string(path)?)?)
}

fn load_store(path: &Path, today: NaiveDate) -> Result<MemoryStore, StreaksCliError> {
    let dataset = load_dataset(path)?;
    Ok(MemoryStore::from_dataset(&dataset, today)?)
}

fn save_store(path: &Path, store: &MemoryStore) -> Result<(), StreaksCliError> {
    fs::write(path, store.to_dataset().to_json()?)?;
    debug!(path = %path.display(), habits = store.habit_count(), check_offs = store.check_off_count(), "saved dataset");
    Ok(())
}

// Error types

#[derive(Debug)]
enum StreaksCliError {
    Io(io::Error),
    Streak(StreakError),
    Store(StoreError),
    Json(serde_json::Error),
    Validation(ValidationError),
    NothingToUpdate,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for StreaksCliError {
    fn from(e: io::Error) -> Self {
        StreaksCliError::Io(e)
    }
}

impl From<StreakError> for StreaksCliError {
    fn from(e: StreakError) -> Self {
        StreaksCliError::Streak(e)
    }
}

impl From<StoreError> for StreaksCliError {
    fn from(e: StoreError) -> Self {
        StreaksCliError::Store(e)
    }
}

impl From<serde_json::Error> for StreaksCliError {
    fn from(e: serde_json::Error) -> Self {
        StreaksCliError::Json(e)
    }
}

impl From<ValidationError> for StreaksCliError {
    fn from(e: ValidationError) -> Self {
        StreaksCliError::Validation(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<StreaksCliError> for CliError {
    fn from(e: StreaksCliError) -> Self {
        match e {
            StreaksCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            StreaksCliError::Streak(StreakError::UnknownHabit(name)) => CliError {
                code: "UNKNOWN_HABIT".to_string(),
                message: format!("Unknown habit: {name}"),
                hint: Some("Run 'streaks habits' to list defined habits".to_string()),
            },
            StreaksCliError::Streak(e) => CliError {
                code: "STREAK_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'streaks validate' to check the dataset".to_string()),
            },
            StreaksCliError::Store(StoreError::HabitNotFound(name)) => CliError {
                code: "HABIT_NOT_FOUND".to_string(),
                message: format!("Habit not found: {name}"),
                hint: Some("Run 'streaks habits' to list defined habits".to_string()),
            },
            StreaksCliError::Store(StoreError::DuplicateHabit(name)) => CliError {
                code: "DUPLICATE_HABIT".to_string(),
                message: format!("The habit with the name {name} does already exist"),
                hint: Some("Choose a different habit name".to_string()),
            },
            StreaksCliError::Store(e) => CliError {
                code: "STORE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'streaks validate' to check the dataset".to_string()),
            },
            StreaksCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            StreaksCliError::Validation(e) => CliError {
                code: "VALIDATION_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Dates use YYYY-MM-DD or YYYY-MM-DD hh:mm and must not lie in the future".to_string()),
            },
            StreaksCliError::NothingToUpdate => CliError {
                code: "NOTHING_TO_UPDATE".to_string(),
                message: "No changes requested".to_string(),
                hint: Some("Pass --task, --periodicity or --reset-check-offs".to_string()),
            },
            StreaksCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{count} entries failed validation"),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            StreaksCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    schema_version: String,
    total_habits: usize,
    total_check_offs: usize,
    invalid_entries: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    location: String,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
