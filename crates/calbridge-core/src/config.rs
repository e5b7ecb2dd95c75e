use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Upper bound past which the worker count is flagged as unusual.
const MAX_REASONABLE_WORKERS: usize = 64;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a single line summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding config.toml and file-backed preferences
    pub config_dir: PathBuf,

    /// Persisted permission flags
    #[serde(default)]
    pub preferences: PreferencesConfig,

    /// Background event writer
    #[serde(default)]
    pub writer: WriterConfig,

    /// Calendar store defaults
    #[serde(default)]
    pub calendar: CalendarConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesConfig {
    /// Storage namespace for the "permission requested" flags.
    ///
    /// Kept identical to the name earlier releases used so existing
    /// installs keep their flags.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_namespace() -> String {
    "REACT_NATIVE_CALENDAR_PREFERENCES".to_string()
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Maximum number of inserts running at once
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

fn default_max_workers() -> usize {
    4
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Calendar every event is written to
    #[serde(default = "default_calendar_id")]
    pub default_calendar_id: i64,

    /// ISO-8601 duration stored with recurring events
    #[serde(default = "default_recurring_duration")]
    pub recurring_duration: String,
}

fn default_calendar_id() -> i64 {
    1
}

fn default_recurring_duration() -> String {
    "PT1H".to_string()
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            default_calendar_id: default_calendar_id(),
            recurring_duration: default_recurring_duration(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calbridge");

        Self {
            config_dir,
            preferences: PreferencesConfig::default(),
            writer: WriterConfig::default(),
            calendar: CalendarConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, writing defaults there if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let mut config = Self::default();
            if let Some(parent) = path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(path)?;
            tracing::info!("Wrote default configuration to {:?}", path);
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.checked()?;
        Ok((config, validation))
    }

    /// Validate an already loaded configuration, failing on errors and logging warnings
    pub fn checked(&self) -> Result<ValidationResult> {
        let validation = self.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(validation)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.preferences.namespace.trim().is_empty() {
            result.add_error("preferences.namespace", "Namespace must not be empty");
        }

        if self.writer.max_workers == 0 {
            result.add_error("writer.max_workers", "At least one worker is required");
        } else if self.writer.max_workers > MAX_REASONABLE_WORKERS {
            result.add_warning(
                "writer.max_workers",
                format!(
                    "Worker count is unusually large (>{})",
                    MAX_REASONABLE_WORKERS
                ),
            );
        }

        if self.calendar.default_calendar_id <= 0 {
            result.add_error(
                "calendar.default_calendar_id",
                "Calendar id must be greater than 0",
            );
        }

        let duration = &self.calendar.recurring_duration;
        if !duration.starts_with('P') || duration.len() < 3 {
            result.add_error(
                "calendar.recurring_duration",
                format!("Not an ISO-8601 duration: {}", duration),
            );
        }

        result
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("calbridge");

        Ok(config_dir.join("config.toml"))
    }

    /// Directory holding file-backed preference namespaces
    pub fn preferences_dir(&self) -> PathBuf {
        self.config_dir.join("preferences")
    }
}
