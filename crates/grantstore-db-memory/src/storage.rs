use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use grantstore_storage::{
    ConcurrencyConflict, Document, DocumentSession, DocumentStore, Query, StorageResult,
};
use papaya::HashMap as PapayaHashMap;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::session::{InMemorySession, PendingChange};

pub type DocumentId = String; // Format: "Collection/uuid"

pub(crate) fn make_document_id(collection: &str) -> DocumentId {
    format!("{collection}/{}", uuid::Uuid::new_v4())
}

/// Shared state behind every handle and session of one store.
#[derive(Debug)]
pub(crate) struct StoreInner {
    /// Committed documents using papaya for lock-free concurrent reads
    pub(crate) documents: PapayaHashMap<DocumentId, Document>,
    /// Atomic counter for generating revisions
    revision_counter: AtomicU64,
    /// Serializes commits so that validation and application are atomic
    commit_gate: Mutex<()>,
}

impl StoreInner {
    fn new() -> Self {
        Self {
            documents: PapayaHashMap::new(),
            revision_counter: AtomicU64::new(1),
            commit_gate: Mutex::new(()),
        }
    }

    fn next_revision(&self) -> u64 {
        self.revision_counter.fetch_add(1, Ordering::SeqCst)
    }

    pub(crate) fn get(&self, id: &str) -> Option<Document> {
        let guard = self.documents.pin();
        guard.get(id).cloned()
    }

    /// Returns committed documents matching `query`, oldest write first,
    /// without applying the query limit.
    pub(crate) fn search(&self, query: &Query) -> Vec<Document> {
        let guard = self.documents.pin();
        let mut matching: Vec<Document> = guard
            .iter()
            .filter(|(_, document)| query.matches(document))
            .map(|(_, document)| document.clone())
            .collect();
        matching.sort_by_key(|document| document.revision);
        matching
    }

    /// Validates and applies a batch of changes under the commit gate.
    ///
    /// Returns the committed documents with their new revisions, or the
    /// first conflict found, in which case nothing is applied.
    pub(crate) async fn commit(
        &self,
        changes: Vec<PendingChange>,
    ) -> Result<Vec<(DocumentId, Option<u64>)>, ConcurrencyConflict> {
        let _gate = self.commit_gate.lock().await;
        let guard = self.documents.pin();

        for change in &changes {
            let actual = guard.get(change.id()).and_then(|document| document.revision);
            let expected = change.expected_revision();
            if actual != expected {
                return Err(ConcurrencyConflict {
                    document_id: change.id().to_string(),
                    expected,
                    actual,
                });
            }
        }

        let mut applied = Vec::with_capacity(changes.len());
        for change in changes {
            match change {
                PendingChange::Put { mut document, .. } => {
                    let revision = self.next_revision();
                    document.revision = Some(revision);
                    applied.push((document.id.clone(), Some(revision)));
                    guard.insert(document.id.clone(), document);
                }
                PendingChange::Delete { id, .. } => {
                    guard.remove(&id);
                    applied.push((id, None));
                }
            }
        }

        Ok(applied)
    }

    /// Removes every document whose expiration is at or before `now`.
    pub(crate) async fn purge_expired(&self, now: OffsetDateTime) -> usize {
        let _gate = self.commit_gate.lock().await;
        let guard = self.documents.pin();

        let expired: Vec<DocumentId> = guard
            .iter()
            .filter(|(_, document)| document.metadata.is_expired_at(now))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            guard.remove(id);
        }

        expired.len()
    }
}

/// In-memory document store backend using papaya lock-free HashMap.
///
/// This backend provides:
/// - Lock-free concurrent reads via papaya::HashMap
/// - Per-document revisions with optimistic concurrency checks at commit
/// - Atomic multi-document commits
/// - Expiration metadata honoured by [`InMemoryDocumentStore::purge_expired`]
///   and the background sweeper
///
/// Cloning the store is cheap and every clone shares the same documents.
#[derive(Debug, Clone)]
pub struct InMemoryDocumentStore {
    pub(crate) inner: Arc<StoreInner>,
}

impl InMemoryDocumentStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner::new()),
        }
    }

    /// Opens a concrete session over this store.
    pub fn session(&self) -> InMemorySession {
        InMemorySession::new(Arc::clone(&self.inner))
    }

    /// Reads a committed document directly, bypassing any session.
    pub fn get(&self, id: &str) -> Option<Document> {
        self.inner.get(id)
    }

    /// Returns all committed documents matching `query`.
    pub fn find(&self, query: &Query) -> Vec<Document> {
        let mut documents = self.inner.search(query);
        if let Some(take) = query.take {
            documents.truncate(take);
        }
        documents
    }

    /// Number of committed documents in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        self.inner.search(&Query::collection(collection)).len()
    }

    /// Deletes every document whose `expires` metadata is at or before `now`.
    ///
    /// Returns the number of documents removed.
    pub async fn purge_expired(&self, now: OffsetDateTime) -> StorageResult<usize> {
        Ok(self.inner.purge_expired(now).await)
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn open_session(&self) -> Arc<dyn DocumentSession> {
        Arc::new(self.session())
    }

    async fn purge_expired(&self, now: OffsetDateTime) -> StorageResult<usize> {
        InMemoryDocumentStore::purge_expired(self, now).await
    }

    fn backend_name(&self) -> &'static str {
        "in-memory-papaya"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn seed(store: &InMemoryDocumentStore, body: serde_json::Value) -> String {
        let session = store.session();
        let id = session
            .store(Document::new("PersistedGrants", body))
            .await
            .unwrap();
        session.save_changes().await.unwrap().into_result().unwrap();
        id
    }

    #[tokio::test]
    async fn test_generated_ids_are_collection_prefixed() {
        let store = InMemoryDocumentStore::new();
        let id = seed(&store, json!({"key": "a"})).await;

        assert!(id.starts_with("PersistedGrants/"));
        let stored = store.get(&id).unwrap();
        assert!(stored.revision.is_some());
        assert_eq!(stored.body["key"], "a");
    }

    #[tokio::test]
    async fn test_find_orders_by_revision() {
        let store = InMemoryDocumentStore::new();
        seed(&store, json!({"key": "first", "clientId": "c1"})).await;
        seed(&store, json!({"key": "second", "clientId": "c1"})).await;
        seed(&store, json!({"key": "third", "clientId": "c2"})).await;

        let found = store.find(&Query::collection("PersistedGrants").where_equals("clientId", "c1"));
        let keys: Vec<_> = found.iter().map(|d| d.body["key"].clone()).collect();
        assert_eq!(keys, vec![json!("first"), json!("second")]);
        assert_eq!(store.count("PersistedGrants"), 3);
        assert_eq!(store.count("DeviceFlowCodes"), 0);
    }

    #[tokio::test]
    async fn test_purge_expired_removes_only_expired() {
        let store = InMemoryDocumentStore::new();
        let now = OffsetDateTime::now_utc();

        let session = store.session();
        let mut expired = Document::new("PersistedGrants", json!({"key": "old"}));
        expired.metadata.expires = Some(now - time::Duration::minutes(1));
        let mut fresh = Document::new("PersistedGrants", json!({"key": "new"}));
        fresh.metadata.expires = Some(now + time::Duration::hours(1));
        let eternal = Document::new("PersistedGrants", json!({"key": "eternal"}));

        let expired_id = session.store(expired).await.unwrap();
        let fresh_id = session.store(fresh).await.unwrap();
        let eternal_id = session.store(eternal).await.unwrap();
        session.save_changes().await.unwrap().into_result().unwrap();

        let removed = store.purge_expired(now).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get(&expired_id).is_none());
        assert!(store.get(&fresh_id).is_some());
        assert!(store.get(&eternal_id).is_some());
    }

    #[tokio::test]
    async fn test_backend_name() {
        let store = InMemoryDocumentStore::new();
        assert_eq!(store.backend_name(), "in-memory-papaya");
    }
}
