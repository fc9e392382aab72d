use std::sync::Arc;

use grantstore_storage::DocumentStore;

use crate::InMemoryDocumentStore;
use crate::expiration::ExpirationOptions;

/// Supported document store backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// In-memory store implemented on top of papaya::HashMap
    InMemoryPapaya,
}

/// Factory configuration to construct a document store.
///
/// `expiration` is not consumed by [`create_document_store`]; it is handed to
/// [`spawn_expiration_sweeper`](crate::spawn_expiration_sweeper) next to the
/// store it builds.
#[derive(Debug, Clone)]
pub struct DocumentStoreConfig {
    pub backend: StorageBackend,
    pub expiration: ExpirationOptions,
}

impl Default for DocumentStoreConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::InMemoryPapaya,
            expiration: ExpirationOptions::default(),
        }
    }
}

/// Type alias for a shareable document store instance
pub type DynDocumentStore = Arc<dyn DocumentStore>;

/// Create a document store based on the provided configuration.
///
/// For now, only the in-memory papaya backend is supported.
pub fn create_document_store(config: &DocumentStoreConfig) -> DynDocumentStore {
    match config.backend {
        StorageBackend::InMemoryPapaya => Arc::new(InMemoryDocumentStore::new()),
    }
}
