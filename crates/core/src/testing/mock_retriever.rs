//! Mock retriever for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::retriever::{RetrievalError, RetrievalRequest, RetrievedFile, Retriever};

/// Bytes written to every successful target file (NetCDF classic magic).
pub const MOCK_FILE_CONTENTS: &[u8] = b"CDF\x01";

/// A recorded retrieval for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRetrieval {
    /// The request that was submitted.
    pub request: RetrievalRequest,
    /// Where the file was to be written.
    pub target: PathBuf,
    /// When the call started.
    pub started_at: Instant,
    /// When the call returned.
    pub finished_at: Instant,
    /// Whether the retrieval succeeded.
    pub success: bool,
}

/// Mock implementation of the Retriever trait.
///
/// Provides controllable behavior for testing:
/// - Track retrievals (with timing) for assertions
/// - Fail specific (date, dataset) requests
/// - Simulate slow downloads
/// - Observe peak concurrency
///
/// # Example
///
/// ```rust,ignore
/// use era5_core::testing::MockRetriever;
///
/// let retriever = MockRetriever::new();
/// retriever
///     .fail_request("20200101", "reanalysis-era5-single-levels", RetrievalError::Timeout)
///     .await;
///
/// // Run the orchestrator...
///
/// assert_eq!(retriever.retrieval_count().await, 4);
/// ```
#[derive(Debug, Clone)]
pub struct MockRetriever {
    /// Recorded retrievals.
    retrievals: Arc<RwLock<Vec<RecordedRetrieval>>>,
    /// Errors keyed by (date, dataset); each is returned once.
    failures: Arc<RwLock<HashMap<(String, String), RetrievalError>>>,
    /// Simulated retrieval duration in milliseconds.
    delay_ms: Arc<RwLock<u64>>,
    /// Calls currently inside `retrieve`.
    in_flight: Arc<AtomicUsize>,
    /// Highest value `in_flight` reached.
    peak_in_flight: Arc<AtomicUsize>,
}

impl Default for MockRetriever {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRetriever {
    /// Create a new mock retriever.
    pub fn new() -> Self {
        Self {
            retrievals: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            delay_ms: Arc::new(RwLock::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get all recorded retrievals.
    pub async fn recorded_retrievals(&self) -> Vec<RecordedRetrieval> {
        self.retrievals.read().await.clone()
    }

    /// Get the number of retrievals performed.
    pub async fn retrieval_count(&self) -> usize {
        self.retrievals.read().await.len()
    }

    /// Make the next request for `date` (`YYYYMMDD`) and `dataset` fail.
    pub async fn fail_request(&self, date: &str, dataset: &str, error: RetrievalError) {
        self.failures
            .write()
            .await
            .insert((date.to_string(), dataset.to_string()), error);
    }

    /// Set the simulated retrieval duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay_ms.write().await = delay.as_millis() as u64;
    }

    /// Highest number of concurrent `retrieve` calls observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn take_failure(&self, request: &RetrievalRequest) -> Option<RetrievalError> {
        self.failures
            .write()
            .await
            .remove(&(request.date.clone(), request.dataset.clone()))
    }

    async fn simulate(
        &self,
        request: &RetrievalRequest,
        target: &Path,
    ) -> Result<RetrievedFile, RetrievalError> {
        let delay_ms = *self.delay_ms.read().await;
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        if let Some(err) = self.take_failure(request).await {
            return Err(err);
        }

        tokio::fs::write(target, MOCK_FILE_CONTENTS).await?;
        Ok(RetrievedFile {
            path: target.to_path_buf(),
            size_bytes: MOCK_FILE_CONTENTS.len() as u64,
        })
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    fn name(&self) -> &str {
        "mock"
    }

    async fn retrieve(
        &self,
        request: &RetrievalRequest,
        target: &Path,
    ) -> Result<RetrievedFile, RetrievalError> {
        let started_at = Instant::now();
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        let result = self.simulate(request, target).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.retrievals.write().await.push(RecordedRetrieval {
            request: request.clone(),
            target: target.to_path_buf(),
            started_at,
            finished_at: Instant::now(),
            success: result.is_ok(),
        });

        result
    }
}
