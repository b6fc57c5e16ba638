//! Error types and recovery strategies for Taleshelf
//!
//! Nothing in the playback core is fatal to a running session. Errors fall into
//! four families, each with a fixed way of degrading:
//! - **Invalid input**: malformed stored records or catalog data, treated as absent
//! - **Not found**: a resume target missing from the catalog, reported to the user
//! - **Transient I/O**: metadata fetch failures, resolved to "unknown"
//! - **Persistence failure**: the store refused a write, playback continues
//!
//! Each error carries a severity and a recovery action so callers can degrade
//! uniformly.

use std::fmt;
use std::io;
use thiserror::Error;

/// Recovery actions that can be taken when an error occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Discard the bad value and fall back to defaults
    UseDefaults,
    /// Show a notice and carry on with a reduced operation
    NotifyUser,
    /// Treat the missing value as unknown and move on
    ResolveAsUnknown,
    /// Try again on a later request
    RetryLater,
    /// Keep playing without durable state for this session
    ContinueWithoutPersistence,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UseDefaults => write!(f, "Falling back to defaults"),
            Self::NotifyUser => write!(f, "Notifying user"),
            Self::ResolveAsUnknown => write!(f, "Resolving as unknown"),
            Self::RetryLater => write!(f, "Retrying later"),
            Self::ContinueWithoutPersistence => write!(f, "Continuing without persistence"),
        }
    }
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Error can be recovered from transparently
    Recoverable,
    /// Feature degraded but the session continues
    Degraded,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Degraded => write!(f, "Degraded"),
        }
    }
}

/// Main error type for Taleshelf
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Invalid input =====
    /// Data could not be parsed or failed validation
    #[error("Invalid {what}: {reason}")]
    InvalidInput { what: String, reason: String },

    /// Invalid argument provided by a caller
    #[error("Invalid argument: {argument} - {reason}")]
    InvalidArgument { argument: String, reason: String },

    // ===== Not found =====
    /// Record not found
    #[error("Not found: {entity} with {identifier}")]
    NotFound { entity: String, identifier: String },

    // ===== Transient I/O =====
    /// A fetch or probe failed
    #[error("Transient I/O failure during {operation}: {message}")]
    TransientIo { operation: String, message: String },

    /// An operation ran past its deadline
    #[error("Timed out after {millis}ms: {operation}")]
    Timeout { operation: String, millis: u64 },

    /// General I/O error
    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: io::Error,
    },

    // ===== Persistence =====
    /// The persistence store rejected a write
    #[error("Could not persist '{key}': {reason}")]
    PersistenceFailed { key: String, reason: String },

    // ===== Generic =====
    /// Generic internal error
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl AppError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::TransientIo { .. } | Self::Timeout { .. } | Self::IoError { .. } => {
                ErrorSeverity::Recoverable
            }
            _ => ErrorSeverity::Degraded,
        }
    }

    /// Returns the recommended recovery action for this error
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            Self::InvalidInput { .. } | Self::InvalidArgument { .. } => {
                RecoveryAction::UseDefaults
            }
            Self::NotFound { .. } => RecoveryAction::NotifyUser,
            Self::TransientIo { .. } | Self::Timeout { .. } => RecoveryAction::ResolveAsUnknown,
            Self::IoError { .. } => RecoveryAction::RetryLater,
            Self::PersistenceFailed { .. } => RecoveryAction::ContinueWithoutPersistence,
            Self::InternalError { .. } => RecoveryAction::NotifyUser,
        }
    }

    /// Returns a user-friendly error message suitable for display in the UI
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput { .. } => "Saved data was unreadable and has been ignored.".to_string(),
            Self::InvalidArgument { .. } => "Invalid input provided.".to_string(),
            Self::NotFound { entity, .. } => format!(
                "The saved {} was not found. It may have been removed or changed.",
                entity
            ),
            Self::TransientIo { .. } | Self::Timeout { .. } => {
                "Some track information could not be loaded.".to_string()
            }
            Self::IoError { .. } => "A file operation failed. Please try again.".to_string(),
            Self::PersistenceFailed { .. } => {
                "Your listening position cannot be saved on this device.".to_string()
            }
            Self::InternalError { .. } => {
                "An unexpected error occurred. Please try again.".to_string()
            }
        }
    }

    /// Returns true if this error can be automatically retried
    pub fn is_retryable(&self) -> bool {
        matches!(self.recovery_action(), RecoveryAction::RetryLater)
    }

    /// Helper to create a not-found error
    pub fn not_found(entity: impl Into<String>, identifier: impl fmt::Display) -> Self {
        Self::NotFound {
            entity: entity.into(),
            identifier: identifier.to_string(),
        }
    }
}

/// Convenience type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        Self::IoError {
            message: err.to_string(),
            source: err,
        }
    }
}
