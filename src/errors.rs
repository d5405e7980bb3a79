//! Shared error types for repowarden operations.
//!
//! The taxonomy follows how each failure is handled:
//!
//! - `UnreadableFile`: local to extraction and scanning. Callers skip the
//!   file, log a warning and continue with a smaller dataset.
//! - `InsufficientData`: raised by trend and effectiveness analysis when fewer
//!   than two health snapshots exist. Always surfaced to the caller.
//! - `BackupFailure`: blocks every mutating cleanup action and forces the
//!   orchestrator back to preview behaviour.
//! - `ThresholdMisconfiguration`: configuration validation at startup.
//!
//! Ratio arithmetic never produces an error: see [`safe_percentage`].

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for repowarden operations
#[derive(Debug, Error)]
pub enum RepoWardenError {
    /// A file could not be read during extraction or scanning
    #[error("Unreadable file {path}: {source}")]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Not enough health snapshots to compare
    #[error("Insufficient data: need at least {required} health snapshots, found {available}")]
    InsufficientData { required: usize, available: usize },

    /// Creating or reading a backup archive failed
    #[error("Backup failure: {0}")]
    BackupFailure(String),

    /// A configured threshold or weight is out of range
    #[error("Threshold misconfiguration in `{field}`: {message}")]
    ThresholdMisconfiguration { field: String, message: String },

    /// A workflow phase ran without the output of an earlier phase
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Another run holds the repository lock
    #[error("Another run is in progress (lock held on {0})")]
    RunInProgress(PathBuf),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML parse errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    /// Glob pattern errors
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
}

impl RepoWardenError {
    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::UnreadableFile {
            path: path.into(),
            source,
        }
    }

    pub fn misconfigured(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ThresholdMisconfiguration {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn insufficient(required: usize, available: usize) -> Self {
        Self::InsufficientData {
            required,
            available,
        }
    }

    /// Configuration errors are user-fixable and map to a usage exit code.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ThresholdMisconfiguration { .. } | Self::Toml(_) | Self::Pattern(_)
        )
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, RepoWardenError>;

/// `numerator / denominator * 100`, defaulting to 0 when the denominator is 0.
pub fn safe_percentage(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 {
        0.0
    } else {
        numerator / denominator * 100.0
    }
}

/// Round to one decimal place for stable report values.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
