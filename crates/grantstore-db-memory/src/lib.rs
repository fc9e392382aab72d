//! In-memory document store backend for the grant store.
//!
//! This crate provides an in-memory implementation of the `DocumentStore`
//! and `DocumentSession` traits from `grantstore-storage`, using papaya
//! lock-free HashMap for concurrent access.
//!
//! # Example
//!
//! ```ignore
//! use grantstore_db_memory::InMemoryDocumentStore;
//! use grantstore_storage::{Document, DocumentSession};
//!
//! let store = InMemoryDocumentStore::new();
//! let session = store.session();
//!
//! let grant = serde_json::json!({"key": "abc", "clientId": "app"});
//! session.store(Document::new("PersistedGrants", grant)).await?;
//! session.save_changes().await?.into_result()?;
//! ```

pub mod expiration;
pub mod factory;
pub mod session;
pub mod storage;

// Re-export the storage traits for convenience
pub use grantstore_storage::{DocumentSession, DocumentStore, StorageError};

pub use expiration::{ExpirationOptions, spawn_expiration_sweeper};
pub use factory::{DocumentStoreConfig, DynDocumentStore, StorageBackend, create_document_store};
pub use session::InMemorySession;
pub use storage::{DocumentId, InMemoryDocumentStore};
