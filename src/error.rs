//! Unified error type for the track pipeline and its I/O boundary.

use thiserror::Error;

/// Errors produced while validating configuration, checking input records,
/// or reading and writing boundary formats.
#[derive(Debug, Error)]
pub enum TrackError {
    /// A point that reached the core with invalid content.
    #[error("invalid point at record {record} (vessel '{vessel_id}'): {reason}")]
    InvalidPoint {
        record: usize,
        vessel_id: String,
        reason: String,
    },

    /// A row that could not be parsed into a point at the input boundary.
    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    /// A port row that could not be normalized.
    #[error("invalid port on line {line}: {reason}")]
    InvalidPort { line: u64, reason: String },

    /// Rejected pipeline configuration.
    #[error("invalid configuration for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// The run was cancelled through its progress callback.
    #[error("track build cancelled after {completed} of {total} vessels")]
    Cancelled { completed: usize, total: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TrackError {
    /// Shorthand for a configuration error.
    pub fn config(field: &'static str, reason: impl Into<String>) -> Self {
        TrackError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// True for per-record errors that are counted and skipped rather than
    /// aborting a run.
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            TrackError::InvalidPoint { .. }
                | TrackError::MalformedRecord { .. }
                | TrackError::InvalidPort { .. }
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TrackError>;
