pub mod config;
pub mod coords;
pub mod fetch;
pub mod retriever;
pub mod testing;
pub mod units;

pub use config::{
    load_config, load_config_from_str, validate_config, Area, CdsConfig, Config, ConfigError,
    ConfigFormat,
};
pub use fetch::{
    enumerate_tasks, DatasetKind, DateRange, DownloadConfig, ExecutionMode, FetchError,
    FetchOrchestrator, FetchTask, RunConfig, RunReport, TaskError, TaskOutcome, TaskStatus,
    DEFAULT_BATCH_SIZE,
};
pub use retriever::{
    CdsClient, CdsCredentials, RetrievalError, RetrievalRequest, RetrievedFile, Retriever,
};
