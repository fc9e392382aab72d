use std::sync::Arc;

use async_trait::async_trait;
use grantstore_storage::{CommitOutcome, Document, DynSession, Query};
use tracing::{debug, error, info, warn};

use crate::entities::{DeviceFlowCodes, fields};
use crate::error::OperationalError;
use crate::mappers::{device_code_to_entity, device_code_to_model};
use crate::models::DeviceCode;
use crate::options::OperationalStoreOptions;
use crate::serialization::PersistentGrantSerializer;
use crate::storage::DeviceFlowStorage;
use crate::OperationalResult;

use super::to_utc;

/// Device flow store over a document session.
#[derive(Clone)]
pub struct DeviceFlowStore {
    session: DynSession,
    serializer: Arc<dyn PersistentGrantSerializer>,
    options: Arc<OperationalStoreOptions>,
}

impl DeviceFlowStore {
    pub fn new(
        session: DynSession,
        serializer: Arc<dyn PersistentGrantSerializer>,
        options: Arc<OperationalStoreOptions>,
    ) -> Self {
        Self {
            session,
            serializer,
            options,
        }
    }

    fn collection(&self) -> &str {
        &self.options.device_flow_codes_collection
    }

    fn document_id(&self, device_code: &str) -> String {
        format!("{}/{}", self.collection(), device_code)
    }

    fn by_field(&self, field: &str, value: &str) -> Query {
        Query::collection(self.collection()).where_equals(field, value)
    }

    async fn find_by(&self, field: &str, value: &str) -> OperationalResult<Option<DeviceCode>> {
        let entity = self
            .session
            .first_or_default(self.by_field(field, value))
            .await?
            .map(|d| d.to_entity::<DeviceFlowCodes>())
            .transpose()?;
        device_code_to_model(self.serializer.as_ref(), entity.as_ref())
    }
}

#[async_trait]
impl DeviceFlowStorage for DeviceFlowStore {
    async fn store_device_authorization(
        &self,
        device_code: &str,
        user_code: &str,
        data: &DeviceCode,
    ) -> OperationalResult<()> {
        let entity = device_code_to_entity(self.serializer.as_ref(), data, device_code, user_code)?
            .ok_or_else(|| OperationalError::validation("device code and user code are required"))?;

        let mut document = Document::from_entity(self.collection(), &entity)?
            .with_id(self.document_id(device_code));
        if self.options.set_token_expire {
            document.metadata.expires = entity.expiration.map(to_utc);
        }

        self.session.store(document).await?;
        self.session.save_changes().await?.into_result()?;

        debug!(device_code, client_id = %entity.client_id, "device authorization stored");
        Ok(())
    }

    async fn find_by_user_code(&self, user_code: &str) -> OperationalResult<Option<DeviceCode>> {
        let model = self.find_by(fields::USER_CODE, user_code).await?;
        debug!(user_code, found = model.is_some(), "user code lookup");
        Ok(model)
    }

    async fn find_by_device_code(&self, device_code: &str) -> OperationalResult<Option<DeviceCode>> {
        let model = self.find_by(fields::DEVICE_CODE, device_code).await?;
        debug!(device_code, found = model.is_some(), "device code lookup");
        Ok(model)
    }

    async fn update_by_user_code(&self, user_code: &str, data: &DeviceCode) -> OperationalResult<()> {
        let Some(mut document) = self
            .session
            .single_or_default(self.by_field(fields::USER_CODE, user_code))
            .await?
        else {
            error!(user_code, "user code not found in database");
            return Err(OperationalError::not_found_for_update("device code", user_code));
        };

        debug!(user_code, "user code found in database");

        let mut existing: DeviceFlowCodes = document.to_entity()?;
        let entity = device_code_to_entity(
            self.serializer.as_ref(),
            data,
            &existing.device_code,
            user_code,
        )?
        .ok_or_else(|| OperationalError::validation("device code and user code are required"))?;

        existing.subject_id = entity.subject_id;
        existing.data = entity.data;
        document.set_entity(&existing)?;
        self.session.store(document).await?;

        if let CommitOutcome::Conflict(conflict) = self.session.save_changes().await? {
            warn!(
                user_code,
                error = %conflict,
                "exception updating user code in database"
            );
        }
        Ok(())
    }

    async fn remove_by_device_code(&self, device_code: &str) -> OperationalResult<()> {
        let Some(document) = self
            .session
            .first_or_default(self.by_field(fields::DEVICE_CODE, device_code))
            .await?
        else {
            debug!(device_code, "no device code found in database");
            return Ok(());
        };

        debug!(device_code, "removing device code from database");
        self.session.delete(&document)?;

        if let CommitOutcome::Conflict(conflict) = self.session.save_changes().await? {
            info!(
                device_code,
                error = %conflict,
                "exception removing device code from database"
            );
        }
        Ok(())
    }
}
