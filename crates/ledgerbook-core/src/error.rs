//! Error types for ledgerbook-core
//!
//! Every engine failure is recoverable at the call site: a failed mutation
//! leaves the account and transaction collections untouched.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Account name already taken
    DuplicateName,
    /// Slip number already used
    DuplicateSlip,
    /// Account not found
    AccountNotFound,
    /// Transaction not found
    TransactionNotFound,
    /// Invalid data format
    InvalidFormat,
    /// Storage read/write failure
    StorageError,
    /// Validation error
    ValidationError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::DuplicateName => write!(f, "DUPLICATE_NAME"),
            ErrorCode::DuplicateSlip => write!(f, "DUPLICATE_SLIP"),
            ErrorCode::AccountNotFound => write!(f, "ACCOUNT_NOT_FOUND"),
            ErrorCode::TransactionNotFound => write!(f, "TRANSACTION_NOT_FOUND"),
            ErrorCode::InvalidFormat => write!(f, "INVALID_FORMAT"),
            ErrorCode::StorageError => write!(f, "STORAGE_ERROR"),
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
        }
    }
}

/// Detailed error information for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    /// Create a new error detail
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    /// Add detail information
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Informational
    Info,
    /// Warning - the request was rejected
    Warning,
    /// Error - data could not be read or written
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Main error type for ledgerbook-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Account with name \"{name}\" already exists")]
    DuplicateName { name: String },

    #[error("Slip No. \"{slip_no}\" already used in account \"{account_name}\"")]
    DuplicateSlip {
        slip_no: String,
        account_name: String,
        date: Option<NaiveDate>,
        description: Option<String>,
    },

    #[error("Account not found: {id}")]
    AccountNotFound { id: String },

    #[error("Transaction not found: {id}")]
    TransactionNotFound { id: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

impl CoreError {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::ValidationError { message: message.into() }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::DuplicateName { .. } => ErrorCode::DuplicateName,
            CoreError::DuplicateSlip { .. } => ErrorCode::DuplicateSlip,
            CoreError::AccountNotFound { .. } => ErrorCode::AccountNotFound,
            CoreError::TransactionNotFound { .. } => ErrorCode::TransactionNotFound,
            CoreError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            CoreError::Storage { .. } => ErrorCode::StorageError,
            CoreError::ValidationError { .. } => ErrorCode::ValidationError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::DuplicateName { .. } => ErrorSeverity::Warning,
            CoreError::DuplicateSlip { .. } => ErrorSeverity::Warning,
            CoreError::AccountNotFound { .. } => ErrorSeverity::Info,
            CoreError::TransactionNotFound { .. } => ErrorSeverity::Info,
            CoreError::InvalidFormat { .. } => ErrorSeverity::Error,
            CoreError::Storage { .. } => ErrorSeverity::Error,
            CoreError::ValidationError { .. } => ErrorSeverity::Warning,
        }
    }

    /// True for either kind of unknown id
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::AccountNotFound { .. } | CoreError::TransactionNotFound { .. }
        )
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::DuplicateName { .. } => {
                details = details.with_suggestion(
                    "Account names are compared without regard to case; choose a different name.".to_string()
                );
            }
            CoreError::DuplicateSlip { slip_no, account_name, date, description } => {
                details = details.with_detail(serde_json::json!({
                    "slip_no": slip_no,
                    "account": account_name,
                    "date": date.map(|d| d.to_string()),
                    "description": description,
                }));
                details = details.with_suggestion(
                    "Slip numbers must be unique across all accounts.".to_string()
                );
            }
            CoreError::AccountNotFound { .. } => {
                details = details.with_suggestion(
                    "Use `ledgerbook account list` to list all accounts.".to_string()
                );
            }
            CoreError::TransactionNotFound { .. } => {
                details = details.with_suggestion(
                    "Check if the transaction ID is correct.".to_string()
                );
            }
            CoreError::InvalidFormat { .. } => {
                details = details.with_suggestion(
                    "A backup must be a JSON object with `accounts` and `transactions` arrays.".to_string()
                );
            }
            CoreError::Storage { .. } => {
                details = details.with_suggestion(
                    "Changes are kept for this session but were not saved.".to_string()
                );
                details = details.with_suggestion(
                    "Check that the data directory exists and is writable.".to_string()
                );
            }
            CoreError::ValidationError { message } => {
                details = details.with_detail(serde_json::json!({ "validation_message": message }));
            }
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<io::Error> for CoreError {
    fn from(error: io::Error) -> Self {
        CoreError::Storage { message: error.to_string() }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(error: serde_json::Error) -> Self {
        CoreError::InvalidFormat { message: error.to_string() }
    }
}

// ==================== Tests ====================
