//! Wiring of document store, options, and serializer into per-request stores.

use std::sync::Arc;

use grantstore_db_memory::{DynDocumentStore, create_document_store, spawn_expiration_sweeper};
use tokio::task::JoinHandle;

use crate::config::OperationalConfig;
use crate::observability::init_tracing;
use crate::options::OperationalStoreOptions;
use crate::serialization::{JsonGrantSerializer, PersistentGrantSerializer};
use crate::stores::{DeviceFlowStore, PersistedGrantStore};

/// Builds operational stores over fresh sessions.
///
/// Constructed once at startup; every call to [`open`](Self::open) starts a
/// new unit of work.
#[derive(Clone)]
pub struct OperationalStoreFactory {
    document_store: DynDocumentStore,
    options: Arc<OperationalStoreOptions>,
    serializer: Arc<dyn PersistentGrantSerializer>,
}

/// Stores sharing one session.
#[derive(Clone)]
pub struct OperationalStores {
    pub persisted_grants: PersistedGrantStore,
    pub device_flow: DeviceFlowStore,
}

impl OperationalStoreFactory {
    pub fn new(
        document_store: DynDocumentStore,
        options: OperationalStoreOptions,
        serializer: Arc<dyn PersistentGrantSerializer>,
    ) -> Self {
        Self {
            document_store,
            options: Arc::new(options),
            serializer,
        }
    }

    /// Creates the configured backend and starts its expiration sweeper.
    ///
    /// Installs tracing from `config.logging` unless a subscriber is already
    /// set. Must be called within a tokio runtime.
    pub fn in_memory(config: &OperationalConfig) -> (Self, Option<JoinHandle<()>>) {
        let tracing_installed = init_tracing(&config.logging);

        let store_config = config.document_store();
        let document_store = create_document_store(&store_config);
        let sweeper =
            spawn_expiration_sweeper(Arc::clone(&document_store), &store_config.expiration);

        tracing::info!(
            backend = document_store.backend_name(),
            set_token_expire = config.operational.set_token_expire,
            sweeper = sweeper.is_some(),
            tracing_installed,
            "Operational store initialized"
        );

        let factory = Self::new(
            document_store,
            config.operational.clone(),
            Arc::new(JsonGrantSerializer),
        );
        (factory, sweeper)
    }

    pub fn options(&self) -> &OperationalStoreOptions {
        &self.options
    }

    /// Opens one session and returns both stores over it.
    pub fn open(&self) -> OperationalStores {
        let session = self.document_store.open_session();
        OperationalStores {
            persisted_grants: PersistedGrantStore::new(session.clone(), self.options.clone()),
            device_flow: DeviceFlowStore::new(session, self.serializer.clone(), self.options.clone()),
        }
    }

    pub fn persisted_grants(&self) -> PersistedGrantStore {
        PersistedGrantStore::new(self.document_store.open_session(), self.options.clone())
    }

    pub fn device_flow(&self) -> DeviceFlowStore {
        DeviceFlowStore::new(
            self.document_store.open_session(),
            self.serializer.clone(),
            self.options.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PersistedGrant;
    use crate::storage::PersistedGrantStorage;
    use time::macros::datetime;

    #[tokio::test]
    async fn test_in_memory_without_sweeper() {
        let mut config = OperationalConfig::default();
        config.expiration.enabled = false;
        config.operational.persisted_grants_collection = "Grants".to_string();

        let (factory, sweeper) = OperationalStoreFactory::in_memory(&config);
        assert!(sweeper.is_none());
        assert_eq!(factory.options().persisted_grants_collection, "Grants");

        let grant = PersistedGrant {
            key: "g1".to_string(),
            grant_type: "refresh_token".to_string(),
            subject_id: None,
            session_id: None,
            client_id: "c1".to_string(),
            description: None,
            creation_time: datetime!(2024-03-01 12:00:00 UTC),
            expiration: None,
            consumed_time: None,
            data: "payload".to_string(),
        };
        factory.persisted_grants().store(&grant).await.unwrap();
        assert_eq!(factory.persisted_grants().get("g1").await.unwrap(), Some(grant));
    }
}
