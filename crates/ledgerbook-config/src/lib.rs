//! Configuration management for ledgerbook
//!
//! This module handles loading, validation, and management of
//! ledgerbook configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::ConfigError;

// ==================== Configuration Types ====================

/// Storage location of the persisted ledger blob
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the data file
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
    /// Storage key, used as the data file name
    #[serde(default = "default_storage_key")]
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            key: default_storage_key(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_storage_key() -> String {
    "ledgerLocalData.json".to_string()
}

/// Ledger view settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Column the ledger view is sorted by when none is requested
    #[serde(default)]
    pub default_sort: SortColumn,
    /// Direction of the default sort
    #[serde(default)]
    pub default_direction: SortDirection,
    /// Shown in the code column when a linked account cannot be resolved
    #[serde(default = "default_unknown_account_label")]
    pub unknown_account_label: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_sort: SortColumn::default(),
            default_direction: SortDirection::default(),
            unknown_account_label: default_unknown_account_label(),
        }
    }
}

fn default_unknown_account_label() -> String {
    "Unknown Account".to_string()
}

/// Sortable ledger view columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Date,
    Description,
    SlipNo,
    Debit,
    Credit,
    DisplayCode,
    Balance,
}

impl Default for SortColumn {
    fn default() -> Self {
        SortColumn::Date
    }
}

impl std::str::FromStr for SortColumn {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "date" => Ok(SortColumn::Date),
            "description" => Ok(SortColumn::Description),
            "slip_no" | "slipno" | "slip" => Ok(SortColumn::SlipNo),
            "debit" => Ok(SortColumn::Debit),
            "credit" => Ok(SortColumn::Credit),
            "display_code" | "code" => Ok(SortColumn::DisplayCode),
            "balance" => Ok(SortColumn::Balance),
            _ => Err(format!("Invalid sort column: {}", s)),
        }
    }
}

impl std::fmt::Display for SortColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortColumn::Date => write!(f, "date"),
            SortColumn::Description => write!(f, "description"),
            SortColumn::SlipNo => write!(f, "slip_no"),
            SortColumn::Debit => write!(f, "debit"),
            SortColumn::Credit => write!(f, "credit"),
            SortColumn::DisplayCode => write!(f, "display_code"),
            SortColumn::Balance => write!(f, "balance"),
        }
    }
}

/// Sort direction enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Desc
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            _ => Err(format!("Invalid sort direction: {}", s)),
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// Currency and number formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// Number of decimal places
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
    /// Thousands separator
    #[serde(default = "default_thousands_sep")]
    pub thousands_separator: String,
    /// Decimal separator
    #[serde(default = "default_decimal_sep")]
    pub decimal_separator: String,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            decimal_places: 2,
            thousands_separator: ",".to_string(),
            decimal_separator: ".".to_string(),
        }
    }
}

fn default_decimal_places() -> u32 {
    2
}

fn default_thousands_sep() -> String {
    ",".to_string()
}

fn default_decimal_sep() -> String {
    ".".to_string()
}

/// Report export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// chrono format pattern for the date column
    #[serde(default = "default_report_date_format")]
    pub date_format: String,
    /// Rows to export when no limit is given (all rows if unset)
    #[serde(default)]
    pub default_line_limit: Option<usize>,
    /// Group thousands in report amounts
    #[serde(default)]
    pub group_thousands: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            date_format: default_report_date_format(),
            default_line_limit: None,
            group_thousands: false,
        }
    }
}

fn default_report_date_format() -> String {
    "%d %b %Y".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Storage settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Ledger view settings
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Currency settings
    #[serde(default)]
    pub currency: CurrencyConfig,
    /// Report settings
    #[serde(default)]
    pub report: ReportConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ConfigError::IoError {
                    message: format!("{}: {}", path.display(), e),
                }
            }
        })?;

        Self::from_yaml(&content)
    }

    /// Load configuration, falling back to defaults when the file does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::FileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
            message: e.to_string(),
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.key.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "storage.key".to_string(),
                reason: "Storage key must not be empty".to_string(),
            });
        }

        if self.currency.decimal_places > 10 {
            return Err(ConfigError::InvalidValue {
                field: "currency.decimal_places".to_string(),
                reason: "Decimal places must be between 0 and 10".to_string(),
            });
        }

        if self.report.date_format.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "report.date_format".to_string(),
                reason: "Date format must not be empty".to_string(),
            });
        }

        if self.report.default_line_limit == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "report.default_line_limit".to_string(),
                reason: "Line limit must be a positive number".to_string(),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Full path of the persisted data file
    pub fn storage_file(&self) -> PathBuf {
        self.storage.path.join(&self.storage.key)
    }
}
