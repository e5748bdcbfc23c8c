//! Error types shared by the sizing engine, the key-value store and the session.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

/// Failure of a sizing computation.
///
/// Validation errors describe bad user input and are recoverable by asking
/// for the value again. Configuration errors point at an unknown slug or an
/// inconsistent [`crate::config::EngineConfig`] and are not user-recoverable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizingError {
    /// A numeric input is missing, non-finite or out of range.
    #[error("invalid input: {field} {message}")]
    Validation {
        /// Input field name (e.g. `"area_m2"`).
        field: &'static str,
        /// Constraint that was violated.
        message: String,
    },
    /// An enumerated value or engine constant is not usable.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SizingError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Returns `true` for errors the caller can fix by re-entering input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Failure of a key-value store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("store encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a session operation: either the computation or the persistence step.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Sizing(#[from] SizingError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
