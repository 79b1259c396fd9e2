//! Configuration
//!
//! Loaded from an optional YAML file, then overridden from `TWL_*`
//! environment variables. Every field has a default, so an empty file (or
//! no file) is a valid configuration.

use crate::eligibility::Thresholds;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid value for {key}: {value}")]
    Override { key: String, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TwlConfig {
    /// Master switch for the whole notification path
    pub send_notifications: bool,
    /// Minimum global edit count
    pub edit_count: u64,
    /// Minimum global account age, in days
    pub registration_days: u64,
    /// SQLite file holding notification state
    pub database: Option<PathBuf>,
    /// YAML/JSON list of global accounts
    pub accounts_file: Option<PathBuf>,
    /// Number of queue shards
    pub workers: usize,
    /// Pending events per shard
    pub queue_capacity: usize,
    /// Default log filter when RUST_LOG is not set
    pub log_level: String,
}

impl Default for TwlConfig {
    fn default() -> Self {
        Self {
            send_notifications: true,
            edit_count: 500,
            registration_days: 182,
            database: None,
            accounts_file: None,
            workers: 4,
            queue_capacity: 1024,
            log_level: "info".to_string(),
        }
    }
}

impl TwlConfig {
    /// Load from `path` (if given), apply environment overrides, validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the environment in production).
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("TWL_SEND_NOTIFICATIONS") {
            self.send_notifications = parse_bool("TWL_SEND_NOTIFICATIONS", &value)?;
        }
        if let Some(value) = lookup("TWL_EDIT_COUNT") {
            self.edit_count = parse_number("TWL_EDIT_COUNT", &value)?;
        }
        if let Some(value) = lookup("TWL_REGISTRATION_DAYS") {
            self.registration_days = parse_number("TWL_REGISTRATION_DAYS", &value)?;
        }
        if let Some(value) = lookup("TWL_DATABASE") {
            self.database = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("TWL_LOG") {
            self.log_level = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid("queue_capacity must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(self.edit_count, self.registration_days)
    }

    /// Configured database path, or ~/.local/share/twl-notifier/state.db
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(default_database_path)
    }
}

fn default_database_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("twl-notifier").join("state.db")
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Override {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Override {
        key: key.to_string(),
        value: value.to_string(),
    })
}
