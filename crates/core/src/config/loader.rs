use figment::{
    providers::{Env, Format, Toml, Yaml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Config file syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Picks the format from the file extension. Anything that is not
    /// `.toml` is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

/// Load configuration from file with environment variable overrides
///
/// Overrides use the `ERA5_` prefix and `__` between nested keys, e.g.
/// `ERA5_DOWNLOAD__BATCH_SIZE=4`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let figment = match ConfigFormat::from_path(path) {
        ConfigFormat::Yaml => Figment::new().merge(Yaml::file(path)),
        ConfigFormat::Toml => Figment::new().merge(Toml::file(path)),
    };

    let config: Config = figment
        .merge(Env::prefixed("ERA5_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from a string (useful for testing)
pub fn load_config_from_str(contents: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
    let figment = match format {
        ConfigFormat::Yaml => Figment::new().merge(Yaml::string(contents)),
        ConfigFormat::Toml => Figment::new().merge(Toml::string(contents)),
    };
    figment
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    const YAML: &str = r#"
Nort: -34
Sout: -47.5
East: 179
West: 166
pressure_var:
  - temperature
  - u_component_of_wind
surface_var:
  - 2m_temperature
pressure_levels: ['1000', '925', 850]
"#;

    #[test]
    fn test_load_config_from_str_yaml() {
        let config = load_config_from_str(YAML, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.north, -34.0);
        assert_eq!(config.east, 179.0);
        assert_eq!(config.pressure_levels, vec![1000, 925, 850]);
        assert_eq!(config.surface_var, vec!["2m_temperature".to_string()]);
    }

    #[test]
    fn test_load_config_from_str_missing_variables() {
        let yaml = r#"
Nort: 10
Sout: 0
East: 10
West: 0
pressure_levels: [500]
"#;
        let result = load_config_from_str(yaml, ConfigFormat::Yaml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/era5.yaml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_yaml_file() {
        let mut temp_file = Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(temp_file, "{}", YAML).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.south, -47.5);
        assert_eq!(config.pressure_var.len(), 2);
    }

    #[test]
    fn test_load_config_from_toml_file() {
        let mut temp_file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            temp_file,
            r#"
Nort = 60.0
Sout = 50.0
East = 5.0
West = -10.0
pressure_var = ["geopotential"]
surface_var = ["total_precipitation"]
pressure_levels = [500]

[download]
batch_size = 3
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.west, -10.0);
        assert_eq!(config.download.batch_size, 3);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("era5_nz.yaml")),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("era5_nz.yml")),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("era5.TOML")),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("no_extension")),
            ConfigFormat::Yaml
        );
    }
}
