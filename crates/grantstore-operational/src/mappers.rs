//! Conversions between domain models and persisted entities.

use crate::entities::{DeviceFlowCodes, PersistedGrantEntity};
use crate::error::OperationalError;
use crate::models::{DeviceCode, PersistedGrant};
use crate::serialization::PersistentGrantSerializer;

impl PersistedGrantEntity {
    /// Converts the stored form into the domain model.
    #[must_use]
    pub fn to_model(&self) -> PersistedGrant {
        PersistedGrant {
            key: self.key.clone(),
            grant_type: self.grant_type.clone(),
            subject_id: self.subject_id.clone(),
            session_id: self.session_id.clone(),
            client_id: self.client_id.clone(),
            description: self.description.clone(),
            creation_time: self.creation_time,
            expiration: self.expiration,
            consumed_time: self.consumed_time,
            data: self.data.clone(),
        }
    }
}

impl PersistedGrant {
    /// Builds a new stored form of this grant.
    #[must_use]
    pub fn to_entity(&self) -> PersistedGrantEntity {
        PersistedGrantEntity {
            key: self.key.clone(),
            grant_type: self.grant_type.clone(),
            subject_id: self.subject_id.clone(),
            session_id: self.session_id.clone(),
            client_id: self.client_id.clone(),
            description: self.description.clone(),
            creation_time: self.creation_time,
            expiration: self.expiration,
            consumed_time: self.consumed_time,
            data: self.data.clone(),
        }
    }

    /// Copies this grant's fields onto an existing stored form.
    pub fn update_entity(&self, entity: &mut PersistedGrantEntity) {
        entity.key.clone_from(&self.key);
        entity.grant_type.clone_from(&self.grant_type);
        entity.subject_id.clone_from(&self.subject_id);
        entity.session_id.clone_from(&self.session_id);
        entity.client_id.clone_from(&self.client_id);
        entity.description.clone_from(&self.description);
        entity.creation_time = self.creation_time;
        entity.expiration = self.expiration;
        entity.consumed_time = self.consumed_time;
        entity.data.clone_from(&self.data);
    }
}

/// Builds the stored form of a device authorization.
///
/// Returns `Ok(None)` if either code is blank.
///
/// # Errors
///
/// Returns `OperationalError::Validation` if the code's lifetime overflows its
/// creation time.
pub fn device_code_to_entity(
    serializer: &dyn PersistentGrantSerializer,
    model: &DeviceCode,
    device_code: &str,
    user_code: &str,
) -> Result<Option<DeviceFlowCodes>, OperationalError> {
    if device_code.trim().is_empty() || user_code.trim().is_empty() {
        return Ok(None);
    }

    let expiration = model.expiration().ok_or_else(|| {
        OperationalError::validation("device code lifetime overflows its creation time")
    })?;

    Ok(Some(DeviceFlowCodes {
        device_code: device_code.to_string(),
        user_code: user_code.to_string(),
        client_id: model.client_id.clone(),
        subject_id: model.subject_id().map(str::to_string),
        session_id: model.session_id.clone(),
        description: model.description.clone(),
        creation_time: model.creation_time,
        expiration: Some(expiration),
        data: serializer.serialize_device_code(model)?,
    }))
}

/// Deserializes the payload of a stored device authorization.
pub fn device_code_to_model(
    serializer: &dyn PersistentGrantSerializer,
    entity: Option<&DeviceFlowCodes>,
) -> Result<Option<DeviceCode>, OperationalError> {
    entity
        .map(|e| serializer.deserialize_device_code(&e.data))
        .transpose()
}
