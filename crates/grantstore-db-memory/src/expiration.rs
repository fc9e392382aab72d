//! Background purge of documents whose expiration metadata has passed.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

use crate::factory::DynDocumentStore;

/// Settings for the expiration sweeper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpirationOptions {
    /// Whether the sweeper runs at all.
    pub enabled: bool,
    /// How often expired documents are purged.
    #[serde(with = "humantime_serde")]
    pub delete_frequency: Duration,
}

impl Default for ExpirationOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            delete_frequency: Duration::from_secs(60),
        }
    }
}

/// Starts a task that periodically purges expired documents from `store`.
///
/// Returns `None` when expiration is disabled or the configured frequency is
/// zero. The task runs until its handle is aborted.
pub fn spawn_expiration_sweeper(
    store: DynDocumentStore,
    options: &ExpirationOptions,
) -> Option<JoinHandle<()>> {
    let options = options.clone();
    if !options.enabled || options.delete_frequency.is_zero() {
        debug!("Expiration sweeper disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = interval(options.delete_frequency);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            backend = store.backend_name(),
            frequency = ?options.delete_frequency,
            "Expiration sweeper started"
        );

        loop {
            ticker.tick().await;

            match store.purge_expired(OffsetDateTime::now_utc()).await {
                Ok(0) => {}
                Ok(purged) => info!(count = purged, "Purged expired documents"),
                Err(e) => error!(error = %e, "Error purging expired documents"),
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryDocumentStore;
    use grantstore_storage::{Document, DocumentSession};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_default_options() {
        let options = ExpirationOptions::default();
        assert!(options.enabled);
        assert_eq!(options.delete_frequency, Duration::from_secs(60));
    }

    #[test]
    fn test_options_humantime_format() {
        let options: ExpirationOptions =
            serde_json::from_value(json!({"delete_frequency": "250ms"})).unwrap();
        assert!(options.enabled);
        assert_eq!(options.delete_frequency, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_disabled_sweeper_is_not_spawned() {
        let store: DynDocumentStore = Arc::new(InMemoryDocumentStore::new());
        let disabled = ExpirationOptions {
            enabled: false,
            ..Default::default()
        };
        assert!(spawn_expiration_sweeper(Arc::clone(&store), &disabled).is_none());

        let zero = ExpirationOptions {
            enabled: true,
            delete_frequency: Duration::ZERO,
        };
        assert!(spawn_expiration_sweeper(store, &zero).is_none());
    }

    #[tokio::test]
    async fn test_sweeper_purges_expired_documents() {
        let store = InMemoryDocumentStore::new();
        let options = ExpirationOptions {
            enabled: true,
            delete_frequency: Duration::from_millis(10),
        };

        let session = store.session();
        let mut stale = Document::new("DeviceFlowCodes", json!({"deviceCode": "d1"}));
        stale.metadata.expires = Some(OffsetDateTime::now_utc() - time::Duration::seconds(5));
        let live = Document::new("DeviceFlowCodes", json!({"deviceCode": "d2"}));
        let stale_id = session.store(stale).await.unwrap();
        let live_id = session.store(live).await.unwrap();
        session.save_changes().await.unwrap().into_result().unwrap();

        let handle = spawn_expiration_sweeper(Arc::new(store.clone()), &options).unwrap();
        for _ in 0..50 {
            if store.get(&stale_id).is_none() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        assert!(store.get(&stale_id).is_none());
        assert!(store.get(&live_id).is_some());
    }
}
