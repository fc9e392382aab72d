//! Unit-of-work session over the in-memory document store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use grantstore_storage::{
    CommitOutcome, Document, DocumentSession, Query, StorageError, StorageResult,
};

use crate::storage::{DocumentId, StoreInner, make_document_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackingStatus {
    Unchanged,
    New,
    Modified,
    Deleted,
}

#[derive(Debug)]
struct TrackedDocument {
    document: Document,
    /// Revision the document had when this session first saw it
    loaded_revision: Option<u64>,
    status: TrackingStatus,
}

/// A change waiting for the next commit.
#[derive(Debug, Clone)]
pub(crate) enum PendingChange {
    Put {
        document: Document,
        expected: Option<u64>,
    },
    Delete {
        id: DocumentId,
        expected: Option<u64>,
    },
}

impl PendingChange {
    pub(crate) fn id(&self) -> &str {
        match self {
            Self::Put { document, .. } => &document.id,
            Self::Delete { id, .. } => id,
        }
    }

    pub(crate) fn expected_revision(&self) -> Option<u64> {
        match self {
            Self::Put { expected, .. } | Self::Delete { expected, .. } => *expected,
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    tracked: HashMap<DocumentId, TrackedDocument>,
}

/// Session over an [`InMemoryDocumentStore`](crate::InMemoryDocumentStore).
///
/// Tracks every document it reads or stores. Writes are buffered until
/// [`DocumentSession::save_changes`]; the commit is checked against the
/// revisions the session observed and applied atomically.
///
/// A rejected commit discards every pending change and forgets the documents
/// they touched, so the next read of those documents goes back to the store.
#[derive(Debug)]
pub struct InMemorySession {
    inner: Arc<StoreInner>,
    state: Mutex<SessionState>,
}

impl InMemorySession {
    pub(crate) fn new(inner: Arc<StoreInner>) -> Self {
        Self {
            inner,
            state: Mutex::new(SessionState::default()),
        }
    }

    fn state(&self) -> StorageResult<MutexGuard<'_, SessionState>> {
        self.state
            .lock()
            .map_err(|_| StorageError::internal("session state lock poisoned"))
    }

    /// Number of documents with changes waiting for the next commit.
    pub fn pending_changes(&self) -> StorageResult<usize> {
        let state = self.state()?;
        Ok(state
            .tracked
            .values()
            .filter(|t| t.status != TrackingStatus::Unchanged)
            .count())
    }

    fn discard_pending(&self) -> StorageResult<()> {
        let mut state = self.state()?;
        state
            .tracked
            .retain(|_, tracked| tracked.status == TrackingStatus::Unchanged);
        Ok(())
    }

    fn track_loaded(state: &mut SessionState, document: &Document) {
        state
            .tracked
            .entry(document.id.clone())
            .or_insert_with(|| TrackedDocument {
                document: document.clone(),
                loaded_revision: document.revision,
                status: TrackingStatus::Unchanged,
            });
    }
}

#[async_trait]
impl DocumentSession for InMemorySession {
    async fn load(&self, id: &str) -> StorageResult<Option<Document>> {
        let mut state = self.state()?;

        if let Some(tracked) = state.tracked.get(id) {
            return Ok(match tracked.status {
                TrackingStatus::Deleted => None,
                _ => Some(tracked.document.clone()),
            });
        }

        let document = self.inner.get(id);
        if let Some(ref document) = document {
            Self::track_loaded(&mut state, document);
        }
        Ok(document)
    }

    async fn query(&self, query: &Query) -> StorageResult<Vec<Document>> {
        let committed = self.inner.search(query);
        let limit = query.take.unwrap_or(usize::MAX);

        let mut state = self.state()?;
        let mut results = Vec::new();
        for document in committed {
            if results.len() >= limit {
                break;
            }
            match state.tracked.get(&document.id) {
                Some(tracked) if tracked.status == TrackingStatus::Deleted => {}
                Some(tracked) => {
                    if query.matches(&tracked.document) {
                        results.push(tracked.document.clone());
                    }
                }
                None => {
                    Self::track_loaded(&mut state, &document);
                    results.push(document);
                }
            }
        }

        Ok(results)
    }

    async fn store(&self, mut document: Document) -> StorageResult<String> {
        if document.collection.is_empty() {
            return Err(StorageError::invalid_document(
                "document has no collection",
            ));
        }

        let mut state = self.state()?;

        if document.id.is_empty() {
            document.id = make_document_id(&document.collection);
            document.revision = None;
            let id = document.id.clone();
            state.tracked.insert(
                id.clone(),
                TrackedDocument {
                    document,
                    loaded_revision: None,
                    status: TrackingStatus::New,
                },
            );
            return Ok(id);
        }

        let id = document.id.clone();
        match state.tracked.get_mut(&id) {
            Some(tracked) => {
                tracked.status = match tracked.status {
                    TrackingStatus::Deleted => {
                        return Err(StorageError::invalid_document(format!(
                            "document {id} was deleted in this session"
                        )));
                    }
                    TrackingStatus::New => TrackingStatus::New,
                    TrackingStatus::Unchanged | TrackingStatus::Modified => {
                        TrackingStatus::Modified
                    }
                };
                document.revision = tracked.loaded_revision;
                tracked.document = document;
            }
            None => {
                let status = if document.revision.is_some() {
                    TrackingStatus::Modified
                } else {
                    TrackingStatus::New
                };
                state.tracked.insert(
                    id.clone(),
                    TrackedDocument {
                        loaded_revision: document.revision,
                        document,
                        status,
                    },
                );
            }
        }

        Ok(id)
    }

    fn delete(&self, document: &Document) -> StorageResult<()> {
        if document.id.is_empty() {
            return Err(StorageError::invalid_document(
                "cannot delete a document without an id",
            ));
        }

        let mut state = self.state()?;
        let status = state.tracked.get(&document.id).map(|t| t.status);
        match status {
            Some(TrackingStatus::New) => {
                state.tracked.remove(&document.id);
            }
            Some(_) => {
                if let Some(tracked) = state.tracked.get_mut(&document.id) {
                    tracked.status = TrackingStatus::Deleted;
                }
            }
            None => {
                state.tracked.insert(
                    document.id.clone(),
                    TrackedDocument {
                        document: document.clone(),
                        loaded_revision: document.revision,
                        status: TrackingStatus::Deleted,
                    },
                );
            }
        }

        Ok(())
    }

    async fn save_changes(&self) -> StorageResult<CommitOutcome> {
        let changes: Vec<PendingChange> = {
            let state = self.state()?;
            state
                .tracked
                .values()
                .filter_map(|tracked| match tracked.status {
                    TrackingStatus::Unchanged => None,
                    TrackingStatus::New | TrackingStatus::Modified => Some(PendingChange::Put {
                        document: tracked.document.clone(),
                        expected: tracked.loaded_revision,
                    }),
                    TrackingStatus::Deleted => Some(PendingChange::Delete {
                        id: tracked.document.id.clone(),
                        expected: tracked.loaded_revision,
                    }),
                })
                .collect()
        };

        if changes.is_empty() {
            return Ok(CommitOutcome::Committed { changes: 0 });
        }

        let applied = match self.inner.commit(changes).await {
            Ok(applied) => applied,
            Err(conflict) => {
                tracing::debug!(
                    document_id = %conflict.document_id,
                    expected = ?conflict.expected,
                    actual = ?conflict.actual,
                    "commit rejected by revision check"
                );
                self.discard_pending()?;
                return Ok(CommitOutcome::Conflict(conflict));
            }
        };

        let mut state = self.state()?;
        for (id, revision) in &applied {
            match revision {
                Some(revision) => {
                    if let Some(tracked) = state.tracked.get_mut(id) {
                        tracked.document.revision = Some(*revision);
                        tracked.loaded_revision = Some(*revision);
                        tracked.status = TrackingStatus::Unchanged;
                    }
                }
                None => {
                    state.tracked.remove(id);
                }
            }
        }

        Ok(CommitOutcome::Committed {
            changes: applied.len(),
        })
    }
}
