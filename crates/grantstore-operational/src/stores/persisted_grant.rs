use std::sync::Arc;

use async_trait::async_trait;
use grantstore_storage::{CommitOutcome, Document, DynSession, Query};
use tracing::{debug, info, warn};

use crate::OperationalResult;
use crate::entities::{PersistedGrantEntity, fields};
use crate::filter::PersistedGrantFilter;
use crate::models::PersistedGrant;
use crate::options::OperationalStoreOptions;
use crate::storage::PersistedGrantStorage;

use super::to_utc;

/// Persisted grant store over a document session.
#[derive(Clone)]
pub struct PersistedGrantStore {
    session: DynSession,
    options: Arc<OperationalStoreOptions>,
}

impl PersistedGrantStore {
    pub fn new(session: DynSession, options: Arc<OperationalStoreOptions>) -> Self {
        Self { session, options }
    }

    fn collection(&self) -> &str {
        &self.options.persisted_grants_collection
    }

    /// Documents are keyed by grant key, so two first writes of one key collide on commit.
    fn document_id(&self, key: &str) -> String {
        format!("{}/{}", self.collection(), key)
    }

    fn by_key(&self, key: &str) -> Query {
        Query::collection(self.collection()).where_equals(fields::KEY, key)
    }

    async fn find_by_filter(&self, filter: &PersistedGrantFilter) -> OperationalResult<Vec<Document>> {
        Ok(self.session.query(&filter.to_query(self.collection())).await?)
    }
}

#[async_trait]
impl PersistedGrantStorage for PersistedGrantStore {
    async fn store(&self, grant: &PersistedGrant) -> OperationalResult<()> {
        let (mut document, entity) = match self.session.single_or_default(self.by_key(&grant.key)).await? {
            None => {
                debug!(key = %grant.key, "persisted grant not found in database");
                let entity = grant.to_entity();
                let document = Document::from_entity(self.collection(), &entity)?
                    .with_id(self.document_id(&grant.key));
                (document, entity)
            }
            Some(mut document) => {
                debug!(key = %grant.key, "persisted grant found in database");
                let mut entity: PersistedGrantEntity = document.to_entity()?;
                grant.update_entity(&mut entity);
                document.set_entity(&entity)?;
                (document, entity)
            }
        };

        if self.options.set_token_expire {
            document.metadata.expires = entity.expiration.map(to_utc);
        }

        self.session.store(document).await?;

        if let CommitOutcome::Conflict(conflict) = self.session.save_changes().await? {
            warn!(
                key = %grant.key,
                error = %conflict,
                "exception updating persisted grant in database"
            );
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> OperationalResult<Option<PersistedGrant>> {
        let document = self.session.first_or_default(self.by_key(key)).await?;
        let model = document
            .map(|d| d.to_entity::<PersistedGrantEntity>())
            .transpose()?
            .map(|e| e.to_model());

        debug!(key, found = model.is_some(), "persisted grant lookup");
        Ok(model)
    }

    async fn get_all(&self, filter: &PersistedGrantFilter) -> OperationalResult<Vec<PersistedGrant>> {
        filter.validate()?;

        let documents = self.find_by_filter(filter).await?;
        let grants = documents
            .iter()
            .map(|d| -> OperationalResult<PersistedGrant> {
                Ok(d.to_entity::<PersistedGrantEntity>()?.to_model())
            })
            .collect::<OperationalResult<Vec<_>>>()?;

        debug!(count = grants.len(), ?filter, "persisted grants found");
        Ok(grants)
    }

    async fn remove(&self, key: &str) -> OperationalResult<()> {
        let Some(document) = self.session.first_or_default(self.by_key(key)).await? else {
            debug!(key, "no persisted grant found in database");
            return Ok(());
        };

        debug!(key, "removing persisted grant from database");
        self.session.delete(&document)?;

        if let CommitOutcome::Conflict(conflict) = self.session.save_changes().await? {
            info!(
                key,
                error = %conflict,
                "exception removing persisted grant from database"
            );
        }
        Ok(())
    }

    async fn remove_all(&self, filter: &PersistedGrantFilter) -> OperationalResult<()> {
        filter.validate()?;

        let documents = self.find_by_filter(filter).await?;
        debug!(count = documents.len(), ?filter, "removing persisted grants from database");

        self.session.delete_all(&documents)?;

        if let CommitOutcome::Conflict(conflict) = self.session.save_changes().await? {
            info!(
                count = documents.len(),
                ?filter,
                error = %conflict,
                "exception removing persisted grants from database"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grantstore_db_memory::InMemoryDocumentStore;
    use grantstore_storage::DocumentStore;
    use time::OffsetDateTime;
    use time::macros::datetime;

    fn grant(key: &str) -> PersistedGrant {
        PersistedGrant {
            key: key.to_string(),
            grant_type: "refresh_token".to_string(),
            subject_id: Some("s1".to_string()),
            session_id: None,
            client_id: "c1".to_string(),
            description: None,
            creation_time: datetime!(2024-03-01 12:00:00 UTC),
            expiration: Some(datetime!(2024-03-01 14:00:00 +02:00)),
            consumed_time: None,
            data: "payload".to_string(),
        }
    }

    fn store_with(backend: &InMemoryDocumentStore, set_token_expire: bool) -> PersistedGrantStore {
        let options = OperationalStoreOptions {
            set_token_expire,
            ..Default::default()
        };
        PersistedGrantStore::new(backend.open_session(), Arc::new(options))
    }

    fn stored_documents(backend: &InMemoryDocumentStore, key: &str) -> Vec<Document> {
        backend.find(&Query::collection("PersistedGrants").where_equals("key", key))
    }

    #[tokio::test]
    async fn test_expiration_mirrored_in_utc() {
        let backend = InMemoryDocumentStore::new();
        store_with(&backend, true).store(&grant("g1")).await.unwrap();

        let docs = stored_documents(&backend, "g1");
        let expires = docs[0].metadata.expires.unwrap();
        assert_eq!(expires, datetime!(2024-03-01 12:00:00 UTC));
        assert!(expires.offset().is_utc());
    }

    #[tokio::test]
    async fn test_no_metadata_when_mirroring_disabled() {
        let backend = InMemoryDocumentStore::new();
        store_with(&backend, false).store(&grant("g1")).await.unwrap();

        assert!(stored_documents(&backend, "g1")[0].metadata.expires.is_none());
    }

    #[tokio::test]
    async fn test_update_clears_stale_expiration() {
        let backend = InMemoryDocumentStore::new();
        store_with(&backend, true).store(&grant("g1")).await.unwrap();

        let mut consent = grant("g1");
        consent.expiration = None;
        store_with(&backend, true).store(&consent).await.unwrap();

        let docs = stored_documents(&backend, "g1");
        assert_eq!(docs.len(), 1);
        assert!(docs[0].metadata.expires.is_none());
    }

    #[tokio::test]
    async fn test_store_twice_in_one_session_keeps_one_record() {
        let backend = InMemoryDocumentStore::new();
        let store = store_with(&backend, true);

        store.store(&grant("g1")).await.unwrap();
        let mut consumed = grant("g1");
        consumed.consumed_time = Some(OffsetDateTime::now_utc());
        store.store(&consumed).await.unwrap();

        let docs = stored_documents(&backend, "g1");
        assert_eq!(docs.len(), 1);
        assert!(docs[0].body.get("consumedTime").is_some());
    }

    #[tokio::test]
    async fn test_document_id_derives_from_key() {
        let backend = InMemoryDocumentStore::new();
        store_with(&backend, true).store(&grant("g1")).await.unwrap();

        assert_eq!(stored_documents(&backend, "g1")[0].id, "PersistedGrants/g1");
    }

    #[tokio::test]
    async fn test_get_all_rejects_empty_filter_before_io() {
        let backend = InMemoryDocumentStore::new();
        let store = store_with(&backend, true);

        let err = store.get_all(&PersistedGrantFilter::default()).await.unwrap_err();
        assert!(err.is_validation());
        let err = store.remove_all(&PersistedGrantFilter::default()).await.unwrap_err();
        assert!(err.is_validation());
    }
}
