//! # grantstore-operational
//!
//! Operational store for short-lived OAuth/OIDC artifacts: persisted grants
//! (refresh tokens, authorization codes, consent records) and device flow
//! codes, kept in a document store.
//!
//! ## Overview
//!
//! - [`PersistedGrantStore`]: get, filtered bulk read and delete, upsert by key
//! - [`DeviceFlowStore`]: lookup by device or user code, issue, authorize, remove
//! - expiration of both record kinds mirrored into document metadata so the
//!   document store can purge them
//!
//! Every store method runs one query or load and at most one commit on the
//! session it was built with. Concurrency conflicts on delete and update
//! paths are logged and absorbed; see [`OperationalError`] for what is
//! surfaced.
//!
//! ## Example
//!
//! ```ignore
//! use grantstore_operational::{OperationalConfig, OperationalStoreFactory, PersistedGrantStorage};
//!
//! let (factory, _sweeper) = OperationalStoreFactory::in_memory(&OperationalConfig::default());
//! let grants = factory.persisted_grants();
//! grants.store(&grant).await?;
//! let found = grants.get(&grant.key).await?;
//! ```

pub mod config;
pub mod entities;
pub mod error;
pub mod factory;
pub mod filter;
pub mod mappers;
pub mod models;
pub mod observability;
pub mod options;
pub mod serialization;
pub mod storage;
pub mod stores;

pub use config::{ConfigError, LoggingConfig, OperationalConfig};
pub use error::OperationalError;
pub use factory::{OperationalStoreFactory, OperationalStores};
pub use filter::PersistedGrantFilter;
pub use models::{Claim, ClaimsPrincipal, DeviceCode, PersistedGrant};
pub use options::OperationalStoreOptions;
pub use serialization::{JsonGrantSerializer, PersistentGrantSerializer};
pub use storage::{DeviceFlowStorage, PersistedGrantStorage};
pub use stores::{DeviceFlowStore, PersistedGrantStore};

/// Type alias for operational store results.
pub type OperationalResult<T> = Result<T, OperationalError>;
