use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by Salon Ledger.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A reader collaborator could not supply its records.
    #[error("Data unavailable from {source_name}: {reason}")]
    DataUnavailable { source_name: String, reason: String },

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed or written.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A month string did not match `YYYY-MM`.
    #[error("Invalid month: {0}")]
    InvalidMonth(String),

    /// A date string did not match `YYYY-MM-DD`.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// An amount string was not a non-negative decimal with at most two
    /// fractional digits.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// A local date-time string did not match `YYYY-MM-DD HH:MM`.
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    /// No record with the given id exists.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    /// A record failed validation before being saved.
    #[error("Invalid {kind}: {reason}")]
    InvalidRecord { kind: &'static str, reason: String },

    /// A new or edited appointment overlaps an existing one.
    #[error("Schedule conflict: {0}")]
    Conflict(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LedgerError {
    /// Wrap any displayable failure of a reader as [`LedgerError::DataUnavailable`].
    pub fn unavailable(source_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        LedgerError::DataUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// `true` for failures that originate in the data-access layer.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(
            self,
            LedgerError::DataUnavailable { .. } | LedgerError::FileRead { .. }
        )
    }
}

/// Convenience alias used throughout the ledger crates.
pub type Result<T> = std::result::Result<T, LedgerError>;
