//! # grantstore-storage
//!
//! Document session abstraction layer for the operational grant store.
//!
//! This crate defines the traits and types that document store backends
//! implement. It does not contain any implementations; the in-memory backend
//! lives in `grantstore-db-memory`.
//!
//! ## Overview
//!
//! The main trait is [`DocumentSession`], a unit of work offering:
//! - load by id and conjunctive equality queries
//! - store and delete with revision tracking
//! - an explicit commit that reports optimistic concurrency conflicts as a
//!   [`CommitOutcome`] rather than as an error
//!
//! ## Example
//!
//! ```ignore
//! use grantstore_storage::{CommitOutcome, DocumentSession, Query};
//!
//! async fn drop_client_grants(session: &dyn DocumentSession) -> Result<(), StorageError> {
//!     let query = Query::collection("PersistedGrants").where_equals("clientId", "app");
//!     let grants = session.query(&query).await?;
//!     session.delete_all(&grants)?;
//!
//!     match session.save_changes().await? {
//!         CommitOutcome::Committed { .. } => Ok(()),
//!         CommitOutcome::Conflict(conflict) => {
//!             tracing::info!(%conflict, "grants changed concurrently");
//!             Ok(())
//!         }
//!     }
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::{DocumentSession, DocumentStore};
pub use types::{
    CommitOutcome, ConcurrencyConflict, Document, DocumentMetadata, Predicate, Query,
};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shareable session trait object.
pub type DynSession = std::sync::Arc<dyn DocumentSession>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use grantstore_storage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ErrorCategory, StorageError};
    pub use crate::traits::{DocumentSession, DocumentStore};
    pub use crate::types::{
        CommitOutcome, ConcurrencyConflict, Document, DocumentMetadata, Predicate, Query,
    };
    pub use crate::{DynSession, StorageResult};
}
