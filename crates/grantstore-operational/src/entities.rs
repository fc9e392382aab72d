//! Persisted document shapes.
//!
//! Field names here are the JSON names the stores query on.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Document field names used in queries.
pub mod fields {
    pub const KEY: &str = "key";
    pub const TYPE: &str = "type";
    pub const CLIENT_ID: &str = "clientId";
    pub const SUBJECT_ID: &str = "subjectId";
    pub const SESSION_ID: &str = "sessionId";
    pub const DEVICE_CODE: &str = "deviceCode";
    pub const USER_CODE: &str = "userCode";
}

/// Stored form of a persisted grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedGrantEntity {
    pub key: String,
    #[serde(rename = "type")]
    pub grant_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub creation_time: OffsetDateTime,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub expiration: Option<OffsetDateTime>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub consumed_time: Option<OffsetDateTime>,
    pub data: String,
}

/// Stored form of a device authorization.
///
/// `data` holds the serialized [`DeviceCode`](crate::models::DeviceCode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceFlowCodes {
    pub device_code: String,
    pub user_code: String,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub creation_time: OffsetDateTime,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub expiration: Option<OffsetDateTime>,
    pub data: String,
}
