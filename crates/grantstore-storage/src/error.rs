//! Storage error types for the document session abstraction layer.
//!
//! This module defines all error types that can occur during document
//! session operations.

use std::fmt;

/// Errors that can occur during document storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A commit was rejected because a tracked document changed underneath
    /// the session.
    #[error("Concurrency conflict on {document_id}: {message}")]
    ConcurrencyConflict {
        /// The id of the conflicting document.
        document_id: String,
        /// Description of the conflict.
        message: String,
    },

    /// A query expected at most one document but matched several.
    #[error("Query on {collection} expected at most one document, found {count}")]
    NonUniqueResult {
        /// The queried collection.
        collection: String,
        /// Number of documents matched (capped by the query limit).
        count: usize,
    },

    /// The document is malformed or cannot be tracked.
    #[error("Invalid document: {message}")]
    InvalidDocument {
        /// Description of why the document is invalid.
        message: String,
    },

    /// Converting a document body to or from a typed entity failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `ConcurrencyConflict` error.
    #[must_use]
    pub fn concurrency_conflict(document_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConcurrencyConflict {
            document_id: document_id.into(),
            message: message.into(),
        }
    }

    /// Creates a new `NonUniqueResult` error.
    #[must_use]
    pub fn non_unique_result(collection: impl Into<String>, count: usize) -> Self {
        Self::NonUniqueResult {
            collection: collection.into(),
            count,
        }
    }

    /// Creates a new `InvalidDocument` error.
    #[must_use]
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a concurrency conflict.
    #[must_use]
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }

    /// Returns `true` if this is a non-unique result error.
    #[must_use]
    pub fn is_non_unique_result(&self) -> bool {
        matches!(self, Self::NonUniqueResult { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConcurrencyConflict { .. } => ErrorCategory::Conflict,
            Self::NonUniqueResult { .. } => ErrorCategory::Query,
            Self::InvalidDocument { .. } => ErrorCategory::Validation,
            Self::Serialization(_) => ErrorCategory::Validation,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of storage errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Optimistic concurrency conflict.
    Conflict,
    /// Query shape or cardinality error.
    Query,
    /// Validation error.
    Validation,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict => write!(f, "conflict"),
            Self::Query => write!(f, "query"),
            Self::Validation => write!(f, "validation"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::concurrency_conflict("PersistedGrants/1", "revision changed");
        assert_eq!(
            err.to_string(),
            "Concurrency conflict on PersistedGrants/1: revision changed"
        );

        let err = StorageError::non_unique_result("DeviceFlowCodes", 2);
        assert_eq!(
            err.to_string(),
            "Query on DeviceFlowCodes expected at most one document, found 2"
        );
    }

    #[test]
    fn test_error_predicates() {
        let err = StorageError::concurrency_conflict("a", "b");
        assert!(err.is_concurrency_conflict());
        assert!(!err.is_non_unique_result());

        let err = StorageError::non_unique_result("c", 3);
        assert!(err.is_non_unique_result());
        assert!(!err.is_concurrency_conflict());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            StorageError::concurrency_conflict("a", "b").category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            StorageError::invalid_document("missing id").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            StorageError::internal("session state lock poisoned").category(),
            ErrorCategory::Internal
        );
        assert_eq!(ErrorCategory::Query.to_string(), "query");
    }
}
