//! Settings loaded from a TOML file
//!
//! Every section is optional:
//! - `[api]` service location and request timeout
//! - `[dictation]` external transcriber command
//! - `[archive]` local transcript archive
//! - `[reports]` where exported reports are saved

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root settings file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub api: ApiSection,

    #[serde(default)]
    pub dictation: DictationSection,

    #[serde(default)]
    pub archive: ArchiveSection,

    #[serde(default)]
    pub reports: ReportsSection,
}

impl SettingsFile {
    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load settings from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let settings: SettingsFile = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "api.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if matches!(&self.dictation.command, Some(command) if command.is_empty()) {
            return Err(ConfigError::Validation(
                "dictation.command must name a program".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSection {
    /// Interview service base URL
    #[serde(default)]
    pub base_url: Option<String>,

    /// Seconds to wait for a start or answer call
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DictationSection {
    /// Transcriber program and arguments; dictation is unavailable without it
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ArchiveSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportsSection {
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
