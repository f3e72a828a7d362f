//! Download settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Number of requests kept in flight by default in parallel mode.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// The `[download]` section of the configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Root directory for downloaded files.
    /// The command line `--output` flag takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Tasks submitted together in parallel mode.
    /// Each batch drains completely before the next one starts, so this is
    /// also the cap on outstanding requests to the data provider.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            batch_size: default_batch_size(),
        }
    }
}

impl DownloadConfig {
    /// Sets the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the output directory.
    pub fn with_output_dir(mut self, path: PathBuf) -> Self {
        self.output_dir = Some(path);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DownloadConfig::default();
        assert_eq!(config.batch_size, 10);
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: DownloadConfig = toml::from_str("").unwrap();
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_config_builder() {
        let config = DownloadConfig::default()
            .with_batch_size(3)
            .with_output_dir(PathBuf::from("/tmp/era5"));
        assert_eq!(config.batch_size, 3);
        assert_eq!(config.output_dir, Some(PathBuf::from("/tmp/era5")));
    }
}
