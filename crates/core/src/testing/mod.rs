//! Testing utilities and mock implementations.
//!
//! This module provides a mock [`Retriever`](crate::retriever::Retriever)
//! so orchestrator runs can be exercised without network access or CDS
//! credentials.
//!
//! # Example
//!
//! ```rust,ignore
//! use era5_core::testing::{fixtures, MockRetriever};
//!
//! let retriever = Arc::new(MockRetriever::new());
//! let orchestrator = FetchOrchestrator::new(retriever.clone(), &DownloadConfig::default());
//! let report = orchestrator
//!     .run(start, end, fixtures::run_config(dir.path()), true)
//!     .await?;
//! ```

mod mock_retriever;

pub use mock_retriever::{MockRetriever, RecordedRetrieval, MOCK_FILE_CONTENTS};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;
    use std::sync::Arc;

    use chrono::NaiveDate;

    use crate::config::Area;
    use crate::fetch::RunConfig;

    /// A New Zealand bounding box with a couple of variables per dataset.
    pub fn run_config(output_root: &Path) -> Arc<RunConfig> {
        Arc::new(RunConfig {
            output_root: output_root.to_path_buf(),
            area: Area {
                north: -34.0,
                south: -47.5,
                east: 179.0,
                west: 166.0,
            },
            pressure_variables: vec![
                "temperature".to_string(),
                "u_component_of_wind".to_string(),
                "v_component_of_wind".to_string(),
            ],
            surface_variables: vec![
                "2m_temperature".to_string(),
                "total_precipitation".to_string(),
            ],
            pressure_levels: vec![1000, 925, 850, 700, 500],
        })
    }

    /// Shorthand for a calendar date.
    pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }
}
