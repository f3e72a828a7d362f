//! Types for batch fetch runs.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{Area, Config, ConfigError};
use crate::retriever::{RetrievalError, RetrievalRequest};

/// Errors that abort a run before any task executes.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Missing or unusable configuration, or an output root that cannot be created.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// End date earlier than start date.
    #[error("invalid date range: end date {end} is before start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

impl From<ConfigError> for FetchError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Errors confined to a single task.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The task's output directory could not be created.
    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The data provider call failed.
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

impl TaskError {
    /// Whether retrying the task later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::CreateDirectory { .. } => false,
            Self::Retrieval(e) => e.is_transient(),
        }
    }
}

/// ERA5 dataset family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// Variables on pressure levels.
    Pressure,
    /// Single-level (surface) variables.
    Surface,
}

impl DatasetKind {
    /// Enumeration order within one day.
    pub const ALL: [DatasetKind; 2] = [DatasetKind::Pressure, DatasetKind::Surface];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pressure => "pressure",
            Self::Surface => "surface",
        }
    }

    /// CDS catalogue name of the dataset.
    pub fn dataset_name(&self) -> &'static str {
        match self {
            Self::Pressure => "reanalysis-era5-pressure-levels",
            Self::Surface => "reanalysis-era5-single-levels",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, FetchError> {
        if end < start {
            return Err(FetchError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days, counting both ends.
    pub fn num_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// Days in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

/// Read-only settings shared by every task of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub output_root: PathBuf,
    pub area: Area,
    pub pressure_variables: Vec<String>,
    pub surface_variables: Vec<String>,
    pub pressure_levels: Vec<u32>,
}

impl RunConfig {
    /// Builds the run configuration from the loaded file.
    ///
    /// `output_override` wins over `download.output_dir`; one of the two must
    /// be set.
    pub fn from_config(
        config: &Config,
        output_override: Option<&Path>,
    ) -> Result<Self, FetchError> {
        let output_root = output_override
            .map(Path::to_path_buf)
            .or_else(|| config.download.output_dir.clone())
            .ok_or_else(|| {
                FetchError::Configuration(
                    "no output directory given (use --output or download.output_dir)".to_string(),
                )
            })?;

        Ok(Self {
            output_root,
            area: config.area(),
            pressure_variables: config.pressure_var.clone(),
            surface_variables: config.surface_var.clone(),
            pressure_levels: config.pressure_levels.clone(),
        })
    }

    /// Variables requested for the given dataset.
    pub fn variables(&self, kind: DatasetKind) -> &[String] {
        match kind {
            DatasetKind::Pressure => &self.pressure_variables,
            DatasetKind::Surface => &self.surface_variables,
        }
    }

    /// Checks that everything a request needs is present.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.output_root.as_os_str().is_empty() {
            return Err(FetchError::Configuration(
                "output directory cannot be empty".to_string(),
            ));
        }
        for kind in DatasetKind::ALL {
            if self.variables(kind).is_empty() {
                return Err(FetchError::Configuration(format!(
                    "no {} variables configured",
                    kind
                )));
            }
        }
        if self.pressure_levels.is_empty() {
            return Err(FetchError::Configuration(
                "no pressure levels configured".to_string(),
            ));
        }
        let area = &self.area;
        if [area.north, area.south, area.east, area.west]
            .iter()
            .any(|v| !v.is_finite())
        {
            return Err(FetchError::Configuration(
                "geographic bounds must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// One (day, dataset) download.
#[derive(Debug, Clone)]
pub struct FetchTask {
    pub kind: DatasetKind,
    pub date: NaiveDate,
    pub config: Arc<RunConfig>,
}

impl FetchTask {
    pub fn new(kind: DatasetKind, date: NaiveDate, config: Arc<RunConfig>) -> Self {
        Self { kind, date, config }
    }

    /// Date formatted as `YYYYMMDD`.
    pub fn date_stamp(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }

    /// `ERA5_<YYYYMMDD>_<kind>.nc`
    pub fn file_name(&self) -> String {
        format!("ERA5_{}_{}.nc", self.date_stamp(), self.kind)
    }

    /// `<root>/<kind>/<year>/<month>/ERA5_<YYYYMMDD>_<kind>.nc`
    pub fn output_path(&self) -> PathBuf {
        self.config
            .output_root
            .join(self.kind.as_str())
            .join(self.date.year().to_string())
            .join(format!("{:02}", self.date.month()))
            .join(self.file_name())
    }

    /// Request for the full day at hourly resolution.
    pub fn request(&self) -> RetrievalRequest {
        let pressure_level = match self.kind {
            DatasetKind::Pressure => Some(
                self.config
                    .pressure_levels
                    .iter()
                    .map(|level| level.to_string())
                    .collect(),
            ),
            DatasetKind::Surface => None,
        };

        RetrievalRequest {
            dataset: self.kind.dataset_name().to_string(),
            product_type: "reanalysis".to_string(),
            format: "netcdf".to_string(),
            variable: self.config.variables(self.kind).to_vec(),
            pressure_level,
            date: self.date_stamp(),
            area: self.config.area.as_cds_area(),
            time: RetrievalRequest::hourly_times(),
        }
    }
}

/// How tasks are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExecutionMode {
    Sequential,
    Parallel { batch_size: usize },
}

/// Final state of one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    Succeeded { size_bytes: u64 },
    Failed { error: String, transient: bool },
}

/// Result of one task, as recorded in the run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub kind: DatasetKind,
    pub date: NaiveDate,
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: TaskStatus,
}

impl TaskOutcome {
    pub fn succeeded(task: &FetchTask, path: PathBuf, size_bytes: u64) -> Self {
        Self {
            kind: task.kind,
            date: task.date,
            path,
            status: TaskStatus::Succeeded { size_bytes },
        }
    }

    pub fn failed(task: &FetchTask, path: PathBuf, error: &TaskError) -> Self {
        Self::failed_with(task, path, error.to_string(), error.is_transient())
    }

    pub fn failed_with(task: &FetchTask, path: PathBuf, error: String, transient: bool) -> Self {
        Self {
            kind: task.kind,
            date: task.date,
            path,
            status: TaskStatus::Failed { error, transient },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, TaskStatus::Succeeded { .. })
    }
}

/// Summary of a run, one outcome per task in enumeration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub mode: ExecutionMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<TaskOutcome>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn output_paths(&self) -> impl Iterator<Item = &Path> {
        self.outcomes.iter().map(|o| o.path.as_path())
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed() == 0
    }
}
