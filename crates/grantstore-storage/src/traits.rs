//! Session and store traits for the document storage abstraction layer.
//!
//! This module defines the unit-of-work contract that all document store
//! backends must implement.

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::error::StorageError;
use crate::types::{CommitOutcome, Document, Query};

/// A unit of work against a document store.
///
/// A session is opened per logical request and never shared across
/// requests. Reads (`load`, `query`) go to the store and start tracking the
/// returned documents with the revision they were read at. Writes (`store`,
/// `delete`) only record intent; nothing reaches the store until
/// `save_changes`, which applies every pending change atomically or none of
/// them.
///
/// # Example
///
/// ```ignore
/// use grantstore_storage::{DocumentSession, Query};
///
/// async fn rename(session: &dyn DocumentSession) -> Result<(), StorageError> {
///     let query = Query::collection("PersistedGrants").where_equals("key", "abc");
///     if let Some(mut doc) = session.first_or_default(query).await? {
///         doc.body["description"] = "renamed".into();
///         session.store(doc).await?;
///         session.save_changes().await?.into_result()?;
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait DocumentSession: Send + Sync {
    /// Loads a document by its physical id.
    ///
    /// Returns `None` if the document does not exist or was deleted in this
    /// session.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing documents.
    async fn load(&self, id: &str) -> Result<Option<Document>, StorageError>;

    /// Runs a conjunctive query against the store.
    ///
    /// Documents already tracked by the session are returned as the session
    /// sees them; documents deleted in the session are omitted. Results are
    /// ordered by the revision at which they were last written.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues.
    async fn query(&self, query: &Query) -> Result<Vec<Document>, StorageError>;

    /// Returns the first document matching `query`, if any.
    async fn first_or_default(&self, query: Query) -> Result<Option<Document>, StorageError> {
        let documents = self.query(&query.take(1)).await?;
        Ok(documents.into_iter().next())
    }

    /// Returns the only document matching `query`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NonUniqueResult` if more than one document matches.
    async fn single_or_default(&self, query: Query) -> Result<Option<Document>, StorageError> {
        let collection = query.collection.clone();
        let mut documents = self.query(&query.take(2)).await?;
        if documents.len() > 1 {
            return Err(StorageError::non_unique_result(collection, documents.len()));
        }
        Ok(documents.pop())
    }

    /// Records a document to be written on the next commit.
    ///
    /// A document with an empty id is assigned a fresh id in its collection.
    /// A document previously read through this session is written back under
    /// the same id and checked against the revision it was read at.
    ///
    /// Returns the document id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidDocument` if the document has no collection.
    async fn store(&self, document: Document) -> Result<String, StorageError>;

    /// Records a document to be deleted on the next commit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidDocument` if the document has no id.
    fn delete(&self, document: &Document) -> Result<(), StorageError>;

    /// Records several documents to be deleted on the next commit.
    fn delete_all(&self, documents: &[Document]) -> Result<(), StorageError> {
        documents.iter().try_for_each(|document| self.delete(document))
    }

    /// Applies every pending change.
    ///
    /// Returns `CommitOutcome::Conflict` without applying anything if any
    /// tracked document changed in the store since it was read.
    /// The rejected changes are discarded along with the tracked state of
    /// the documents they touched.
    ///
    /// # Errors
    ///
    /// Returns an error for infrastructure issues.
    async fn save_changes(&self) -> Result<CommitOutcome, StorageError>;
}

/// A document store that hands out sessions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Opens a new unit of work.
    fn open_session(&self) -> Arc<dyn DocumentSession>;

    /// Deletes every document whose `expires` metadata is at or before `now`.
    ///
    /// Returns the number of documents removed.
    async fn purge_expired(&self, now: OffsetDateTime) -> Result<usize, StorageError>;

    /// Returns the name of this backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
