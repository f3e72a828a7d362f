//! Fetch orchestrator implementation.
//!
//! Drives every (day, dataset) task of a run through the retriever:
//! - Sequential: one task at a time, in enumeration order
//! - Parallel: batches of `batch_size` spawned together; the next batch is
//!   submitted only once the current one has drained

use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::retriever::{RetrievedFile, Retriever};

use super::config::DownloadConfig;
use super::types::{
    DateRange, DatasetKind, ExecutionMode, FetchError, FetchTask, RunConfig, RunReport, TaskError,
    TaskOutcome,
};

/// Creates the tasks of a run: ascending dates, pressure before surface.
pub fn enumerate_tasks(range: &DateRange, config: &Arc<RunConfig>) -> Vec<FetchTask> {
    range
        .days()
        .flat_map(|day| {
            DatasetKind::ALL
                .into_iter()
                .map(move |kind| FetchTask::new(kind, day, Arc::clone(config)))
        })
        .collect()
}

/// The fetch orchestrator - downloads one file per (day, dataset kind).
pub struct FetchOrchestrator {
    retriever: Arc<dyn Retriever>,
    batch_size: usize,
    span: Span,
}

impl FetchOrchestrator {
    /// Create a new orchestrator.
    pub fn new(retriever: Arc<dyn Retriever>, settings: &DownloadConfig) -> Self {
        Self {
            retriever,
            batch_size: settings.batch_size.max(1),
            span: info_span!("era5_fetch"),
        }
    }

    /// Log under the given span instead of the default `era5_fetch` one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Tasks submitted together in parallel mode.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Download every (day, kind) pair of `[start, end]`.
    ///
    /// Fails before touching the retriever if the range is inverted, the
    /// configuration is incomplete, or the output root cannot be created.
    /// Individual task failures are recorded in the report instead.
    pub async fn run(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        config: Arc<RunConfig>,
        parallel: bool,
    ) -> Result<RunReport, FetchError> {
        let range = DateRange::new(start, end)?;
        config.validate()?;

        tokio::fs::create_dir_all(&config.output_root)
            .await
            .map_err(|e| {
                FetchError::Configuration(format!(
                    "cannot create output directory {}: {}",
                    config.output_root.display(),
                    e
                ))
            })?;

        let tasks = enumerate_tasks(&range, &config);
        let mode = if parallel {
            ExecutionMode::Parallel {
                batch_size: self.batch_size,
            }
        } else {
            ExecutionMode::Sequential
        };
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        info!(
            parent: &self.span,
            %run_id,
            retriever = self.retriever.name(),
            days = range.num_days(),
            tasks = tasks.len(),
            ?mode,
            "Starting ERA5 download from {} to {} into {}",
            range.start(),
            range.end(),
            config.output_root.display()
        );

        let outcomes = match mode {
            ExecutionMode::Sequential => self.run_sequential(tasks).await,
            ExecutionMode::Parallel { batch_size } => self.run_parallel(tasks, batch_size).await,
        };

        let report = RunReport {
            run_id,
            mode,
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };

        if report.is_complete_success() {
            info!(
                parent: &self.span,
                %run_id,
                "All downloads completed ({} files)",
                report.total()
            );
        } else {
            warn!(
                parent: &self.span,
                %run_id,
                succeeded = report.succeeded(),
                failed = report.failed(),
                "Downloads completed with failures"
            );
        }

        Ok(report)
    }

    async fn run_sequential(&self, tasks: Vec<FetchTask>) -> Vec<TaskOutcome> {
        let mut outcomes = Vec::with_capacity(tasks.len());
        let mut current_day = None;

        for task in &tasks {
            if current_day != Some(task.date) {
                info!(parent: &self.span, "Downloading data for {}", task.date);
                current_day = Some(task.date);
            }
            let span = self.task_span(task);
            let outcome = execute_task(self.retriever.as_ref(), task)
                .instrument(span)
                .await;
            outcomes.push(outcome);
        }

        outcomes
    }

    async fn run_parallel(&self, tasks: Vec<FetchTask>, batch_size: usize) -> Vec<TaskOutcome> {
        let mut outcomes = Vec::with_capacity(tasks.len());
        let total_batches = tasks.len().div_ceil(batch_size);

        for (index, batch) in tasks.chunks(batch_size).enumerate() {
            debug!(
                parent: &self.span,
                batch = index + 1,
                total_batches,
                size = batch.len(),
                "Submitting batch"
            );

            let handles: Vec<_> = batch
                .iter()
                .map(|task| {
                    let retriever = Arc::clone(&self.retriever);
                    let task = task.clone();
                    let span = self.task_span(&task);
                    tokio::spawn(
                        async move { execute_task(retriever.as_ref(), &task).await }
                            .instrument(span),
                    )
                })
                .collect();

            // Joined in submission order; all handles are already running.
            for (task, joined) in batch.iter().zip(join_all(handles).await) {
                let outcome = joined.unwrap_or_else(|e| {
                    error!(
                        parent: &self.span,
                        "Download worker for {} {} data aborted: {}",
                        task.date,
                        task.kind,
                        e
                    );
                    TaskOutcome::failed_with(
                        task,
                        task.output_path(),
                        format!("download worker aborted: {}", e),
                        false,
                    )
                });
                outcomes.push(outcome);
            }

            debug!(
                parent: &self.span,
                batch = index + 1,
                total_batches,
                "Batch drained"
            );
        }

        outcomes
    }

    fn task_span(&self, task: &FetchTask) -> Span {
        info_span!(parent: &self.span, "fetch_task", date = %task.date, kind = %task.kind)
    }
}

/// Runs one task; errors never escape this boundary.
async fn execute_task(retriever: &dyn Retriever, task: &FetchTask) -> TaskOutcome {
    let path = task.output_path();
    debug!("Downloading {}-level data", task.kind);

    match fetch_one(retriever, task, &path).await {
        Ok(file) => {
            info!(
                bytes = file.size_bytes,
                "Downloaded {}-level data for {} to {}",
                task.kind,
                task.date_stamp(),
                file.path.display()
            );
            TaskOutcome::succeeded(task, path, file.size_bytes)
        }
        Err(e) => {
            error!(
                transient = e.is_transient(),
                "Error downloading {}-level data for {}: {}",
                task.kind,
                task.date_stamp(),
                e
            );
            TaskOutcome::failed(task, path, &e)
        }
    }
}

async fn fetch_one(
    retriever: &dyn Retriever,
    task: &FetchTask,
    path: &Path,
) -> Result<RetrievedFile, TaskError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| TaskError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let request = task.request();
    Ok(retriever.retrieve(&request, path).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Area;
    use crate::testing::MockRetriever;
    use std::path::PathBuf;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn run_config(root: PathBuf) -> Arc<RunConfig> {
        Arc::new(RunConfig {
            output_root: root,
            area: Area {
                north: 10.0,
                south: 0.0,
                east: 10.0,
                west: 0.0,
            },
            pressure_variables: vec!["temperature".to_string()],
            surface_variables: vec!["2m_temperature".to_string()],
            pressure_levels: vec![850],
        })
    }

    #[test]
    fn test_enumerate_two_days() {
        let range = DateRange::new(date(2020, 1, 1), date(2020, 1, 2)).unwrap();
        let tasks = enumerate_tasks(&range, &run_config(PathBuf::from("/out")));

        let order: Vec<_> = tasks.iter().map(|t| (t.date, t.kind)).collect();
        assert_eq!(
            order,
            vec![
                (date(2020, 1, 1), DatasetKind::Pressure),
                (date(2020, 1, 1), DatasetKind::Surface),
                (date(2020, 1, 2), DatasetKind::Pressure),
                (date(2020, 1, 2), DatasetKind::Surface),
            ]
        );
    }

    #[test]
    fn test_enumerate_count_is_twice_days() {
        let config = run_config(PathBuf::from("/out"));
        for days in [1u64, 2, 31, 366] {
            let start = date(2020, 1, 1);
            let end = start + chrono::Days::new(days - 1);
            let range = DateRange::new(start, end).unwrap();
            assert_eq!(enumerate_tasks(&range, &config).len(), 2 * days as usize);
        }
    }

    #[test]
    fn test_enumerated_paths_are_unique() {
        let range = DateRange::new(date(2019, 12, 30), date(2020, 1, 3)).unwrap();
        let tasks = enumerate_tasks(&range, &run_config(PathBuf::from("/out")));
        let paths: Vec<PathBuf> = tasks.iter().map(|t| t.output_path()).collect();

        for (i, a) in paths.iter().enumerate() {
            for (j, b) in paths.iter().enumerate() {
                if i != j {
                    assert!(!b.starts_with(a), "{:?} is a prefix of {:?}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_batch_size_zero_is_clamped() {
        let orchestrator = FetchOrchestrator::new(
            Arc::new(MockRetriever::new()),
            &DownloadConfig::default().with_batch_size(0),
        );
        assert_eq!(orchestrator.batch_size(), 1);
    }

    #[tokio::test]
    async fn test_sequential_run_writes_files() {
        let temp = tempfile::TempDir::new().unwrap();
        let retriever = Arc::new(MockRetriever::new());
        let orchestrator = FetchOrchestrator::new(retriever.clone(), &DownloadConfig::default());

        let report = orchestrator
            .run(
                date(2020, 1, 1),
                date(2020, 1, 1),
                run_config(temp.path().to_path_buf()),
                false,
            )
            .await
            .unwrap();

        assert_eq!(report.mode, ExecutionMode::Sequential);
        assert_eq!(report.succeeded(), 2);
        for path in report.output_paths() {
            assert!(path.is_file(), "missing {:?}", path);
        }
        assert_eq!(retriever.retrieval_count().await, 2);
    }

    #[tokio::test]
    async fn test_inverted_range_runs_nothing() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path().join("never-created");
        let retriever = Arc::new(MockRetriever::new());
        let orchestrator = FetchOrchestrator::new(retriever.clone(), &DownloadConfig::default());

        let result = orchestrator
            .run(date(2020, 1, 2), date(2020, 1, 1), run_config(root.clone()), true)
            .await;

        assert!(matches!(result, Err(FetchError::InvalidRange { .. })));
        assert_eq!(retriever.retrieval_count().await, 0);
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_incomplete_config_is_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut config = (*run_config(temp.path().to_path_buf())).clone();
        config.pressure_levels.clear();
        let retriever = Arc::new(MockRetriever::new());
        let orchestrator = FetchOrchestrator::new(retriever.clone(), &DownloadConfig::default());

        let result = orchestrator
            .run(date(2020, 1, 1), date(2020, 1, 1), Arc::new(config), false)
            .await;

        assert!(matches!(result, Err(FetchError::Configuration(_))));
        assert_eq!(retriever.retrieval_count().await, 0);
    }

    #[tokio::test]
    async fn test_uncreatable_output_root_is_configuration_error() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        // A regular file cannot be used as a directory.
        let root = temp.path().join("era5");
        let orchestrator =
            FetchOrchestrator::new(Arc::new(MockRetriever::new()), &DownloadConfig::default());

        let result = orchestrator
            .run(date(2020, 1, 1), date(2020, 1, 1), run_config(root), false)
            .await;

        assert!(matches!(result, Err(FetchError::Configuration(_))));
    }
}
