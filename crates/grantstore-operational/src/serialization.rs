//! Conversion of grant payloads to and from opaque string blobs.

use crate::error::OperationalError;
use crate::models::DeviceCode;

/// Serializer for payloads stored inside grant records.
///
/// Implementations must round-trip losslessly.
pub trait PersistentGrantSerializer: Send + Sync {
    /// Serializes a device authorization payload.
    fn serialize_device_code(&self, value: &DeviceCode) -> Result<String, OperationalError>;

    /// Deserializes a device authorization payload.
    fn deserialize_device_code(&self, data: &str) -> Result<DeviceCode, OperationalError>;
}

/// JSON serializer backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonGrantSerializer;

impl PersistentGrantSerializer for JsonGrantSerializer {
    fn serialize_device_code(&self, value: &DeviceCode) -> Result<String, OperationalError> {
        Ok(serde_json::to_string(value)?)
    }

    fn deserialize_device_code(&self, data: &str) -> Result<DeviceCode, OperationalError> {
        Ok(serde_json::from_str(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Claim, ClaimsPrincipal};
    use time::macros::datetime;

    #[test]
    fn test_device_code_round_trip() {
        let code = DeviceCode {
            client_id: "tv".to_string(),
            creation_time: datetime!(2024-03-01 12:00:00.123456 UTC),
            lifetime: 300,
            is_open_id: true,
            is_authorized: true,
            requested_scopes: vec!["openid".to_string()],
            authorized_scopes: Some(vec!["openid".to_string()]),
            subject: Some(ClaimsPrincipal::new(vec![Claim::new("sub", "alice")])),
            session_id: Some("sid".to_string()),
            description: Some("living room".to_string()),
        };

        let serializer = JsonGrantSerializer;
        let blob = serializer.serialize_device_code(&code).unwrap();
        assert_eq!(serializer.deserialize_device_code(&blob).unwrap(), code);
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        let err = JsonGrantSerializer
            .deserialize_device_code("not json")
            .unwrap_err();
        assert!(matches!(err, OperationalError::Serialization(_)));
    }
}
