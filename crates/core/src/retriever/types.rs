//! Types for the retriever module.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One CDS retrieval: a dataset name plus the request body sent for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalRequest {
    /// Catalogue name, e.g. `reanalysis-era5-single-levels`.
    #[serde(skip)]
    pub dataset: String,
    pub product_type: String,
    pub format: String,
    pub variable: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure_level: Option<Vec<String>>,
    /// `YYYYMMDD`
    pub date: String,
    /// `[north, west, south, east]`
    pub area: [f64; 4],
    pub time: Vec<String>,
}

impl RetrievalRequest {
    /// `00:00` through `23:00`.
    pub fn hourly_times() -> Vec<String> {
        (0..24).map(|hour| format!("{:02}:00", hour)).collect()
    }
}

/// A file written by a retriever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedFile {
    pub path: PathBuf,
    pub size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hourly_times() {
        let times = RetrievalRequest::hourly_times();
        assert_eq!(times.len(), 24);
        assert_eq!(times[0], "00:00");
        assert_eq!(times[9], "09:00");
        assert_eq!(times[23], "23:00");
    }

    #[test]
    fn test_request_body_shape() {
        let request = RetrievalRequest {
            dataset: "reanalysis-era5-single-levels".to_string(),
            product_type: "reanalysis".to_string(),
            format: "netcdf".to_string(),
            variable: vec!["2m_temperature".to_string()],
            pressure_level: None,
            date: "20200101".to_string(),
            area: [-34.0, 166.0, -47.5, 179.0],
            time: vec!["00:00".to_string()],
        };

        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("dataset").is_none());
        assert!(body.get("pressure_level").is_none());
        assert_eq!(body["product_type"], "reanalysis");
        assert_eq!(body["format"], "netcdf");
        assert_eq!(body["date"], "20200101");
        assert_eq!(body["area"][1], 166.0);
    }
}
