//! Operational store error types.
//!
//! Only validation failures, updates of codes that were never issued, and
//! hard storage or payload failures surface here. Concurrency conflicts on
//! delete and update paths are absorbed by the stores.

use grantstore_storage::{ErrorCategory, StorageError};

/// Errors returned by the grant and device flow stores.
#[derive(Debug, thiserror::Error)]
pub enum OperationalError {
    /// Input was rejected before any I/O, e.g. an empty grant filter.
    #[error("Validation error: {message}")]
    Validation {
        /// Description of why the input is invalid.
        message: String,
    },

    /// An update targeted a record that does not exist.
    #[error("Could not update {entity}: {key} not found")]
    NotFoundForUpdate {
        /// Kind of record that was being updated.
        entity: &'static str,
        /// Lookup key used for the update.
        key: String,
    },

    /// The document store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A grant payload could not be serialized or deserialized.
    #[error("Payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OperationalError {
    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new `NotFoundForUpdate` error.
    #[must_use]
    pub fn not_found_for_update(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFoundForUpdate {
            entity,
            key: key.into(),
        }
    }

    /// Returns `true` if this is a validation error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns `true` if this is a not-found-for-update error.
    #[must_use]
    pub fn is_not_found_for_update(&self) -> bool {
        matches!(self, Self::NotFoundForUpdate { .. })
    }

    /// Returns `true` if the underlying storage reported a concurrency conflict.
    #[must_use]
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_concurrency_conflict())
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } | Self::Serialization(_) => ErrorCategory::Validation,
            Self::NotFoundForUpdate { .. } => ErrorCategory::Query,
            Self::Storage(e) => e.category(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OperationalError::not_found_for_update("device code", "ABCD-1234");
        assert_eq!(
            err.to_string(),
            "Could not update device code: ABCD-1234 not found"
        );

        let err = OperationalError::validation("no filter values set");
        assert_eq!(err.to_string(), "Validation error: no filter values set");
    }

    #[test]
    fn test_storage_errors_pass_through() {
        let err: OperationalError =
            StorageError::concurrency_conflict("DeviceFlowCodes/1", "already exists").into();
        assert!(err.is_concurrency_conflict());
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert!(err.to_string().starts_with("Concurrency conflict"));
    }

    #[test]
    fn test_error_predicates() {
        assert!(OperationalError::validation("x").is_validation());
        assert!(!OperationalError::validation("x").is_not_found_for_update());
        assert!(OperationalError::not_found_for_update("device code", "u").is_not_found_for_update());
    }
}
