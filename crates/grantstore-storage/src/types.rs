//! Document, query, and commit types for the document session abstraction.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::StorageResult;

/// Store-level metadata attached to a document.
///
/// Metadata lives beside the document body and is interpreted by the
/// backend rather than by the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Point in time (UTC) after which the backend may purge the document.
    #[serde(
        rename = "@expires",
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub expires: Option<OffsetDateTime>,
}

impl DocumentMetadata {
    /// Returns `true` if the document's expiration is at or before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }
}

/// A document as seen by a session.
///
/// `id` is the physical document identity assigned by the store. A document
/// that has never been committed has no `revision`; an empty `id` asks the
/// session to generate one when the document is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Physical document id, e.g. `PersistedGrants/3f2b...`.
    pub id: String,
    /// Collection the document belongs to.
    pub collection: String,
    /// Revision of the persisted copy this document was read from.
    pub revision: Option<u64>,
    /// Backend-interpreted metadata.
    pub metadata: DocumentMetadata,
    /// Document body as JSON.
    pub body: Value,
}

impl Document {
    /// Creates a new, not yet persisted document.
    #[must_use]
    pub fn new(collection: impl Into<String>, body: Value) -> Self {
        Self {
            id: String::new(),
            collection: collection.into(),
            revision: None,
            metadata: DocumentMetadata::default(),
            body,
        }
    }

    /// Creates a new document whose body is the JSON form of `entity`.
    pub fn from_entity<T: Serialize>(collection: impl Into<String>, entity: &T) -> StorageResult<Self> {
        Ok(Self::new(collection, serde_json::to_value(entity)?))
    }

    /// Sets an explicit document id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Deserializes the body into a typed entity.
    pub fn to_entity<T: DeserializeOwned>(&self) -> StorageResult<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }

    /// Replaces the body with the JSON form of `entity`, keeping identity,
    /// revision, and metadata.
    pub fn set_entity<T: Serialize>(&mut self, entity: &T) -> StorageResult<()> {
        self.body = serde_json::to_value(entity)?;
        Ok(())
    }

    /// Returns `true` if this document has never been committed.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.revision.is_none()
    }

    /// Returns a top-level field of the body.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }
}

/// Equality predicate over a top-level document field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    /// Field name in the document body.
    pub field: String,
    /// Value the field must equal.
    pub value: Value,
}

impl Predicate {
    /// Creates an equality predicate.
    #[must_use]
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Check if a document satisfies this predicate.
    ///
    /// A missing field only matches a `null` value.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        match document.field(&self.field) {
            Some(actual) => actual == &self.value,
            None => self.value.is_null(),
        }
    }
}

/// Conjunctive query over one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Collection to query.
    pub collection: String,
    /// Predicates that must all hold.
    pub predicates: Vec<Predicate>,
    /// Maximum number of documents to return.
    pub take: Option<usize>,
}

impl Query {
    /// Starts a query over `collection` with no predicates.
    #[must_use]
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            predicates: Vec::new(),
            take: None,
        }
    }

    /// Adds an equality predicate.
    #[must_use]
    pub fn where_equals(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::equals(field, value));
        self
    }

    /// Limits the number of returned documents.
    #[must_use]
    pub fn take(mut self, take: usize) -> Self {
        self.take = Some(take);
        self
    }

    /// Check if a document belongs to the collection and satisfies every
    /// predicate.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        document.collection == self.collection && self.predicates.iter().all(|p| p.matches(document))
    }
}

/// Details of an optimistic concurrency failure detected at commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcurrencyConflict {
    /// Id of the first document that failed its revision check.
    pub document_id: String,
    /// Revision the session expected (`None` for a new document).
    pub expected: Option<u64>,
    /// Revision found in the store (`None` if the document is gone).
    pub actual: Option<u64>,
}

impl fmt::Display for ConcurrencyConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.expected, self.actual) {
            (None, Some(actual)) => write!(
                f,
                "document {} already exists at revision {actual}",
                self.document_id
            ),
            (Some(expected), None) => write!(
                f,
                "document {} was deleted (expected revision {expected})",
                self.document_id
            ),
            (Some(expected), Some(actual)) => write!(
                f,
                "document {} is at revision {actual}, expected {expected}",
                self.document_id
            ),
            (None, None) => write!(f, "document {} changed concurrently", self.document_id),
        }
    }
}

/// Result of a successful `save_changes` round trip.
///
/// Hard failures are reported through `StorageError`; an optimistic
/// concurrency failure is an expected outcome and is reported here so that
/// callers decide explicitly whether to absorb or propagate it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum CommitOutcome {
    /// All pending changes were applied.
    Committed {
        /// Number of documents written or deleted.
        changes: usize,
    },
    /// Nothing was applied because a tracked document changed concurrently.
    Conflict(ConcurrencyConflict),
}

impl CommitOutcome {
    /// Returns `true` if the commit was applied.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    /// Converts a conflict into `StorageError::ConcurrencyConflict`.
    pub fn into_result(self) -> StorageResult<usize> {
        match self {
            Self::Committed { changes } => Ok(changes),
            Self::Conflict(conflict) => Err(crate::StorageError::concurrency_conflict(
                conflict.document_id.clone(),
                conflict.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn grant_document() -> Document {
        Document::new(
            "PersistedGrants",
            json!({"key": "g1", "clientId": "c1", "subjectId": null}),
        )
        .with_id("PersistedGrants/1")
    }

    #[test]
    fn test_query_matches_collection_and_predicates() {
        let doc = grant_document();

        assert!(Query::collection("PersistedGrants").matches(&doc));
        assert!(
            Query::collection("PersistedGrants")
                .where_equals("key", "g1")
                .where_equals("clientId", "c1")
                .matches(&doc)
        );
        assert!(
            !Query::collection("PersistedGrants")
                .where_equals("clientId", "c2")
                .matches(&doc)
        );
        assert!(
            !Query::collection("DeviceFlowCodes")
                .where_equals("key", "g1")
                .matches(&doc)
        );
    }

    #[test]
    fn test_predicate_null_matches_missing_and_null() {
        let doc = grant_document();
        assert!(Predicate::equals("subjectId", Value::Null).matches(&doc));
        assert!(Predicate::equals("sessionId", Value::Null).matches(&doc));
        assert!(!Predicate::equals("sessionId", "s1").matches(&doc));
    }

    #[test]
    fn test_metadata_expiration() {
        let now = OffsetDateTime::now_utc();
        let mut metadata = DocumentMetadata::default();
        assert!(!metadata.is_expired_at(now));

        metadata.expires = Some(now - time::Duration::seconds(1));
        assert!(metadata.is_expired_at(now));

        metadata.expires = Some(now + time::Duration::minutes(5));
        assert!(!metadata.is_expired_at(now));
    }

    #[test]
    fn test_conflict_outcome_into_result() {
        let outcome = CommitOutcome::Conflict(ConcurrencyConflict {
            document_id: "PersistedGrants/1".to_string(),
            expected: Some(3),
            actual: Some(4),
        });
        assert!(!outcome.is_committed());

        let err = outcome.into_result().unwrap_err();
        assert!(err.is_concurrency_conflict());
        assert!(err.to_string().contains("expected 3"));

        let changes = CommitOutcome::Committed { changes: 2 }.into_result().unwrap();
        assert_eq!(changes, 2);
    }
}
