//! Application configuration
//!
//! Values come from the optional settings file first, then environment
//! variables override them.

pub mod file;

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use file::{ConfigError, SettingsFile};

/// Settings file used when `COPILOT_CONFIG` is not set
pub const DEFAULT_CONFIG_FILE: &str = "copilot.toml";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub request_timeout: Duration,
    pub data_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub dictation_command: Option<Vec<String>>,
    pub archive_enabled: bool,
}

impl Config {
    /// Load the settings file (explicit path, `COPILOT_CONFIG`, or
    /// `copilot.toml` if present) and apply the environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match path {
            Some(path) => SettingsFile::from_file(path)?,
            None => {
                let path = env::var("COPILOT_CONFIG")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
                if path.exists() {
                    SettingsFile::from_file(&path)?
                } else {
                    SettingsFile::default()
                }
            }
        };

        Self::from_settings(settings, |key| env::var(key).ok())
    }

    fn from_settings(
        settings: SettingsFile,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let timeout_secs = match var("COPILOT_REQUEST_TIMEOUT_SECS") {
            Some(value) => value.parse::<u64>().map_err(|_| {
                ConfigError::Validation(format!(
                    "COPILOT_REQUEST_TIMEOUT_SECS is not a number: {}",
                    value
                ))
            })?,
            None => settings.api.timeout_secs.unwrap_or(60),
        };
        if timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            api_url: var("COPILOT_API_URL")
                .or(settings.api.base_url)
                .unwrap_or_else(|| "http://127.0.0.1:8000".into()),
            request_timeout: Duration::from_secs(timeout_secs),
            data_dir: var("COPILOT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data")),
            reports_dir: var("COPILOT_REPORTS_DIR")
                .map(PathBuf::from)
                .or(settings.reports.dir)
                .unwrap_or_else(|| PathBuf::from("./reports")),
            dictation_command: settings.dictation.command,
            archive_enabled: settings.archive.enabled,
        })
    }

    pub fn archive_path(&self) -> PathBuf {
        self.data_dir.join("copilot.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_settings(SettingsFile::default(), lookup(&[])).unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:8000");
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.archive_path(), PathBuf::from("./data/copilot.db"));
        assert_eq!(config.reports_dir, PathBuf::from("./reports"));
        assert!(config.dictation_command.is_none());
        assert!(config.archive_enabled);
    }

    #[test]
    fn test_env_overrides_file() {
        let settings = SettingsFile::parse(
            "[api]\nbase_url = \"http://file:8000\"\ntimeout_secs = 10\n[reports]\ndir = \"file-reports\"\n",
        )
        .unwrap();

        let config = Config::from_settings(
            settings,
            lookup(&[
                ("COPILOT_API_URL", "http://env:9000"),
                ("COPILOT_REQUEST_TIMEOUT_SECS", "5"),
            ]),
        )
        .unwrap();

        assert_eq!(config.api_url, "http://env:9000");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.reports_dir, PathBuf::from("file-reports"));
    }

    #[test]
    fn test_invalid_timeout_env() {
        let result = Config::from_settings(
            SettingsFile::default(),
            lookup(&[("COPILOT_REQUEST_TIMEOUT_SECS", "soon")]),
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));

        let result = Config::from_settings(
            SettingsFile::default(),
            lookup(&[("COPILOT_REQUEST_TIMEOUT_SECS", "0")]),
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
