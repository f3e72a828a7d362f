use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Bounds are finite, latitudes within [-90, 90], north not south of south
/// - Longitudes within [-180, 360]
/// - Variable and pressure-level lists are non-empty
/// - Pressure levels within 1..=1000 hPa
/// - Batch size and poll interval are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let area = config.area();
    for (key, value) in [
        ("Nort", area.north),
        ("Sout", area.south),
        ("East", area.east),
        ("West", area.west),
    ] {
        if !value.is_finite() {
            return Err(ConfigError::ValidationError(format!(
                "{} must be a finite number",
                key
            )));
        }
    }

    for (key, value) in [("Nort", area.north), ("Sout", area.south)] {
        if !(-90.0..=90.0).contains(&value) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be within [-90, 90], got {}",
                key, value
            )));
        }
    }

    for (key, value) in [("East", area.east), ("West", area.west)] {
        if !(-180.0..=360.0).contains(&value) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be within [-180, 360], got {}",
                key, value
            )));
        }
    }

    if area.north < area.south {
        return Err(ConfigError::ValidationError(format!(
            "Nort ({}) is south of Sout ({})",
            area.north, area.south
        )));
    }

    if config.pressure_var.is_empty() {
        return Err(ConfigError::ValidationError(
            "pressure_var cannot be empty".to_string(),
        ));
    }

    if config.surface_var.is_empty() {
        return Err(ConfigError::ValidationError(
            "surface_var cannot be empty".to_string(),
        ));
    }

    if config.pressure_levels.is_empty() {
        return Err(ConfigError::ValidationError(
            "pressure_levels cannot be empty".to_string(),
        ));
    }

    if let Some(level) = config
        .pressure_levels
        .iter()
        .find(|level| !(1..=1000).contains(*level))
    {
        return Err(ConfigError::ValidationError(format!(
            "pressure level {} hPa is outside 1..=1000",
            level
        )));
    }

    if config.download.batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "download.batch_size cannot be 0".to_string(),
        ));
    }

    if config.cds.poll_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "cds.poll_interval_secs cannot be 0".to_string(),
        ));
    }

    if config.cds.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "cds.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CdsConfig;
    use crate::fetch::DownloadConfig;

    fn valid_config() -> Config {
        Config {
            north: -34.0,
            south: -47.5,
            east: 179.0,
            west: 166.0,
            pressure_var: vec!["temperature".to_string()],
            surface_var: vec!["2m_temperature".to_string()],
            pressure_levels: vec![1000, 850],
            download: DownloadConfig::default(),
            cds: CdsConfig::default(),
        }
    }

    fn validation_message(config: &Config) -> String {
        match validate_config(config) {
            Err(ConfigError::ValidationError(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_inverted_latitudes_fails() {
        let mut config = valid_config();
        config.north = -50.0;
        assert!(validation_message(&config).contains("south of Sout"));
    }

    #[test]
    fn test_validate_latitude_out_of_range_fails() {
        let mut config = valid_config();
        config.north = 91.0;
        assert!(validation_message(&config).contains("Nort"));
    }

    #[test]
    fn test_validate_nan_fails() {
        let mut config = valid_config();
        config.east = f64::NAN;
        assert!(validation_message(&config).contains("finite"));
    }

    #[test]
    fn test_validate_empty_lists_fail() {
        let mut config = valid_config();
        config.pressure_var.clear();
        assert!(validation_message(&config).contains("pressure_var"));

        let mut config = valid_config();
        config.surface_var.clear();
        assert!(validation_message(&config).contains("surface_var"));

        let mut config = valid_config();
        config.pressure_levels.clear();
        assert!(validation_message(&config).contains("pressure_levels"));
    }

    #[test]
    fn test_validate_level_out_of_range_fails() {
        let mut config = valid_config();
        config.pressure_levels.push(1100);
        assert!(validation_message(&config).contains("1100"));
    }

    #[test]
    fn test_validate_zero_batch_size_fails() {
        let mut config = valid_config();
        config.download.batch_size = 0;
        assert!(validation_message(&config).contains("batch_size"));
    }

    #[test]
    fn test_validate_zero_cds_durations_fail() {
        let mut config = valid_config();
        config.cds.poll_interval_secs = 0;
        assert!(validation_message(&config).contains("poll_interval_secs"));

        let mut config = valid_config();
        config.cds.timeout_secs = 0;
        assert!(validation_message(&config).contains("timeout_secs"));
    }
}
