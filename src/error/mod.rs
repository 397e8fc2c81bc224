//! # Error Module
//!
//! User-friendly error types for the photo triage engine.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Per-item failures are values** - an unreadable photo is skipped,
//!   it never aborts the run
//! - **Cancellation is not a failure** - it surfaces as a terminal phase

use crate::core::source::ImageRef;
use crate::events::RunPhase;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Stage error: {0}")]
    Stage(#[from] StageError),

    #[error("An analysis is already running. Wait for it to finish or cancel it first.")]
    ConcurrentRunRejected,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while discovering photos
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Stage-level outcomes that stop a stage from producing a result
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("Stage was cancelled")]
    Cancelled,

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),
}

/// Failure of a byte-level computation (decode, feature extraction, scoring)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComputeError {
    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("{0}")]
    Computation(String),
}

/// Why a single item was skipped by a stage.
///
/// These never stop a run; they only reduce the number of photos
/// that were analyzed successfully.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    #[error("Failed to read {item}: {reason}")]
    Read { item: ImageRef, reason: String },

    #[error("{phase} failed for {item}: {source}")]
    Compute {
        item: ImageRef,
        phase: RunPhase,
        #[source]
        source: ComputeError,
    },
}

impl ItemError {
    /// The item this failure belongs to
    pub fn item(&self) -> &ImageRef {
        match self {
            ItemError::Read { item, .. } | ItemError::Compute { item, .. } => item,
        }
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_error_includes_path() {
        let error = ScanError::DirectoryNotFound {
            path: PathBuf::from("/photos/vacation"),
        };
        assert!(error.to_string().contains("/photos/vacation"));
    }

    #[test]
    fn read_error_includes_item_and_reason() {
        let error = ItemError::Read {
            item: ImageRef::new("/photos/broken.jpg"),
            reason: "permission denied".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/broken.jpg"));
        assert!(message.contains("permission denied"));
    }

    #[test]
    fn compute_error_names_the_phase() {
        let error = ItemError::Compute {
            item: ImageRef::new("/photos/a.png"),
            phase: RunPhase::Scoring,
            source: ComputeError::Decode("truncated PNG".to_string()),
        };
        let message = error.to_string();
        assert!(message.contains("Scoring"));
        assert!(message.contains("/photos/a.png"));
        assert_eq!(error.item(), &ImageRef::new("/photos/a.png"));
    }

    #[test]
    fn rejected_run_suggests_recovery() {
        let message = AnalysisError::ConcurrentRunRejected.to_string();
        assert!(message.contains("cancel"));
    }
}
