use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

use crate::fetch::DownloadConfig;

/// Root configuration
///
/// Key names for the bounding box follow the download YAML files already in
/// use (`Nort`, `Sout`, `East`, `West`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(rename = "Nort")]
    pub north: f64,
    #[serde(rename = "Sout")]
    pub south: f64,
    #[serde(rename = "East")]
    pub east: f64,
    #[serde(rename = "West")]
    pub west: f64,
    /// Variables requested from the pressure-level dataset.
    pub pressure_var: Vec<String>,
    /// Variables requested from the single-level dataset.
    pub surface_var: Vec<String>,
    /// Pressure levels in hPa. Accepts integers or numeric strings.
    #[serde(deserialize_with = "deserialize_levels")]
    pub pressure_levels: Vec<u32>,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub cds: CdsConfig,
}

impl Config {
    /// Geographic bounds of the request.
    pub fn area(&self) -> Area {
        Area {
            north: self.north,
            south: self.south,
            east: self.east,
            west: self.west,
        }
    }
}

/// Geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Area {
    /// Bounds in the `[north, west, south, east]` order the CDS API expects.
    pub fn as_cds_area(&self) -> [f64; 4] {
        [self.north, self.west, self.south, self.east]
    }
}

/// Climate Data Store client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CdsConfig {
    /// Credentials file; falls back to `CDSAPI_RC` or `~/.cdsapirc`.
    #[serde(default)]
    pub credentials: Option<PathBuf>,
    /// Delay between task status polls (default: 5)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Per-request HTTP timeout in seconds (default: 120)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for CdsConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            poll_interval_secs: default_poll_interval(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_poll_interval() -> u64 {
    5
}

fn default_timeout() -> u64 {
    120
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LevelValue {
    Number(u32),
    Text(String),
}

fn deserialize_levels<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<LevelValue>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|level| match level {
            LevelValue::Number(n) => Ok(n),
            LevelValue::Text(s) => s.trim().parse::<u32>().map_err(|_| {
                serde::de::Error::custom(format!("invalid pressure level: {:?}", s))
            }),
        })
        .collect()
}
