//! Error types for the key-value stores

use std::path::PathBuf;
use taleshelf_core::AppError;
use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by the key-value stores
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing file could not be read
    #[error("Failed to read store at {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The backing file could not be written
    #[error("Failed to write store at {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The backing file is not a JSON object of strings
    #[error("Store at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to serialize the entries
    #[error("Failed to serialize store: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// The write would push the store past its size limit
    #[error("Writing '{key}' would exceed the {limit} byte quota")]
    QuotaExceeded { key: String, limit: usize },

    /// A lock guarding the entries was poisoned
    #[error("Store lock poisoned")]
    LockPoisoned,
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        let key = match &err {
            StorageError::QuotaExceeded { key, .. } => key.clone(),
            _ => String::new(),
        };
        AppError::PersistenceFailed {
            key,
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taleshelf_core::RecoveryAction;

    #[test]
    fn test_quota_error_maps_to_persistence_failure() {
        let err: AppError = StorageError::QuotaExceeded {
            key: "lastPlayedAudio".to_string(),
            limit: 16,
        }
        .into();

        assert!(matches!(
            &err,
            AppError::PersistenceFailed { key, .. } if key == "lastPlayedAudio"
        ));
        assert_eq!(
            err.recovery_action(),
            RecoveryAction::ContinueWithoutPersistence
        );
    }

    #[test]
    fn test_write_error_display() {
        let err = StorageError::WriteError {
            path: PathBuf::from("/tmp/store.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/tmp/store.json"));
    }
}
