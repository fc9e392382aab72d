use serde::{Deserialize, Serialize};

pub const DEFAULT_PERSISTED_GRANTS_COLLECTION: &str = "PersistedGrants";
pub const DEFAULT_DEVICE_FLOW_CODES_COLLECTION: &str = "DeviceFlowCodes";

/// Options read by the operational stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationalStoreOptions {
    /// Mirror record expiration into document metadata so the document
    /// store can purge expired records.
    pub set_token_expire: bool,

    /// Collection holding persisted grants.
    pub persisted_grants_collection: String,

    /// Collection holding device flow codes.
    pub device_flow_codes_collection: String,
}

impl Default for OperationalStoreOptions {
    fn default() -> Self {
        Self {
            set_token_expire: true,
            persisted_grants_collection: DEFAULT_PERSISTED_GRANTS_COLLECTION.to_string(),
            device_flow_codes_collection: DEFAULT_DEVICE_FLOW_CODES_COLLECTION.to_string(),
        }
    }
}
