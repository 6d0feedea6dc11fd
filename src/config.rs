use crate::core::{HrdeskError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database-related configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path, or ":memory:"
    pub path: String,
    pub foreign_keys: bool,
    /// Create missing tables of the HR schema at startup
    pub bootstrap_schema: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: "hr.db".to_string(),
            foreign_keys: true,
            bootstrap_schema: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "warn".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn level(&self) -> Result<tracing::Level> {
        self.level
            .parse()
            .map_err(|_| HrdeskError::Config(format!("invalid log level '{}'", self.level)))
    }
}

/// Loads configuration from a TOML file at the given path.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| HrdeskError::Config(e.to_string()))
}

/// `<config dir>/hrdesk/config.toml`, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hrdesk").join("config.toml"))
}

/// Loads an explicitly given file, or the default file when it exists,
/// or falls back to built-in defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => load_config(path),
        None => match default_config_path() {
            Some(default) if default.exists() => load_config(default),
            _ => Ok(Config::default()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE_CONFIG: &str = r#"
[database]
path = "/var/lib/hrdesk/hr.db"
foreign_keys = false

[logging]
level = "debug"
"#;

    #[test]
    fn test_load_config_from_str() {
        let config: Config = toml::from_str(SAMPLE_CONFIG).expect("Failed to parse sample config");
        assert_eq!(config.database.path, "/var/lib/hrdesk/hr.db");
        assert!(!config.database.foreign_keys);
        assert!(config.database.bootstrap_schema);
        assert_eq!(config.logging.level().unwrap(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.database.path, "hr.db");
        assert_eq!(config.logging.level().unwrap(), tracing::Level::WARN);
    }

    #[test]
    fn test_invalid_log_level() {
        let logging = LoggingConfig {
            level: "chatty".to_string(),
        };
        assert!(matches!(logging.level(), Err(HrdeskError::Config(_))));
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_CONFIG.as_bytes()).unwrap();
        let config = load_or_default(Some(file.path())).unwrap();
        assert_eq!(config.database.path, "/var/lib/hrdesk/hr.db");
    }

    #[test]
    fn test_load_config_errors() {
        assert!(matches!(
            load_config("/nonexistent/hrdesk.toml"),
            Err(HrdeskError::Io(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[database\npath = 1").unwrap();
        assert!(matches!(load_config(file.path()), Err(HrdeskError::Config(_))));
    }
}
