//! Batch fetch orchestration for ERA5 downloads.
//!
//! A run turns a date range into one task per (day, dataset kind) and drives
//! every task through a [`Retriever`](crate::retriever::Retriever):
//! - **Sequential**: one task at a time, in enumeration order
//! - **Parallel**: fixed-size batches; a batch fully drains before the next
//!   one is submitted
//!
//! A failed task is logged and recorded in the [`RunReport`]; it never stops
//! the rest of the run.

mod config;
mod runner;
mod types;

pub use config::{DownloadConfig, DEFAULT_BATCH_SIZE};
pub use runner::{enumerate_tasks, FetchOrchestrator};
pub use types::{
    DatasetKind, DateRange, ExecutionMode, FetchError, FetchTask, RunConfig, RunReport,
    TaskError, TaskOutcome, TaskStatus,
};
