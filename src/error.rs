//! Error types shared by the record engine.
//!
//! Errors are classified by how the caller recovers:
//! - `ValidationFailed`: the edit session stays open so the user can correct input
//! - `PersistenceFailed`: the write was not applied and in-memory state is untouched
//! - `ConflictDetected`: the write was never attempted

use std::fmt;

use thiserror::Error;

/// Why a field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    Empty,
    OutOfRange,
    StartAfterEnd,
    Malformed,
    Unknown,
}

impl ValidationReason {
    /// Stable reason code, useful in logs.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationReason::Empty => "empty",
            ValidationReason::OutOfRange => "out-of-range",
            ValidationReason::StartAfterEnd => "start-after-end",
            ValidationReason::Malformed => "malformed",
            ValidationReason::Unknown => "unknown",
        }
    }
}

/// A single rejected field. The `field` is the human label ("Postal Code").
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: ValidationReason,
    pub detail: Option<String>,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: ValidationReason) -> Self {
        Self {
            field,
            reason,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            ValidationReason::Empty => write!(f, "'{}' should not be empty.", self.field)?,
            ValidationReason::OutOfRange => {
                write!(f, "'{}' is outside business hours.", self.field)?
            }
            ValidationReason::StartAfterEnd => {
                write!(f, "'{}' must be before the end.", self.field)?
            }
            ValidationReason::Malformed => write!(f, "'{}' is not a valid value.", self.field)?,
            ValidationReason::Unknown => {
                write!(f, "'{}' does not refer to an existing record.", self.field)?
            }
        }
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

/// Lower-level cause of a failed write or read.
#[derive(Debug, Error)]
pub enum PersistenceCause {
    #[error("{0}")]
    Sql(#[from] rusqlite::Error),

    #[error("no rows were affected")]
    NoRowsAffected,
}

/// Everything the engine can report back to the presentation layer.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    ValidationFailed(#[from] ValidationError),

    #[error("Could not {operation}: {cause}")]
    PersistenceFailed {
        operation: &'static str,
        #[source]
        cause: PersistenceCause,
    },

    #[error("{kind} overlaps existing record(s) {}", join_ids(.conflicting))]
    ConflictDetected {
        kind: &'static str,
        conflicting: Vec<i64>,
    },
}

impl EngineError {
    /// Wrap a driver error, logging it on the way through so nothing escapes
    /// unclassified.
    pub fn sql(operation: &'static str, err: rusqlite::Error) -> Self {
        log::error!("{operation} failed: {err}");
        EngineError::PersistenceFailed {
            operation,
            cause: PersistenceCause::Sql(err),
        }
    }

    pub fn no_rows(operation: &'static str) -> Self {
        log::warn!("{operation} affected no rows");
        EngineError::PersistenceFailed {
            operation,
            cause: PersistenceCause::NoRowsAffected,
        }
    }

    /// Whether the edit session that triggered this error should stay open.
    pub fn keeps_session_open(&self) -> bool {
        matches!(
            self,
            EngineError::ValidationFailed(_) | EngineError::ConflictDetected { .. }
        )
    }
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| format!("#{id}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type EngineResult<T> = Result<T, EngineError>;
