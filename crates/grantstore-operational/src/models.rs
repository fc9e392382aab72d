//! Domain models exchanged with the token and device flow services.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Claim type carrying the subject identifier.
pub const SUBJECT_CLAIM: &str = "sub";

/// A persisted OAuth/OIDC artifact such as a refresh token, an
/// authorization code, or a consent record.
///
/// `key` is the sole identity; at most one grant exists per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedGrant {
    /// Unique, opaque grant key.
    pub key: String,

    /// Grant type, e.g. `refresh_token` or `authorization_code`.
    #[serde(rename = "type")]
    pub grant_type: String,

    /// Subject the grant was issued for (None for client-only grants).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,

    /// Login session the grant belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Client the grant was issued to.
    pub client_id: String,

    /// Free-form description supplied by the user or client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(with = "time::serde::rfc3339")]
    pub creation_time: OffsetDateTime,

    /// When the grant expires (None = never).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub expiration: Option<OffsetDateTime>,

    /// When a one-time grant was consumed.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub consumed_time: Option<OffsetDateTime>,

    /// Opaque serialized grant payload.
    pub data: String,
}

/// A single claim of a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "type")]
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// The authenticated user behind a device authorization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsPrincipal {
    pub claims: Vec<Claim>,
}

impl ClaimsPrincipal {
    pub fn new(claims: Vec<Claim>) -> Self {
        Self { claims }
    }

    /// Returns the first claim of the given type.
    #[must_use]
    pub fn find_first(&self, claim_type: &str) -> Option<&Claim> {
        self.claims.iter().find(|c| c.claim_type == claim_type)
    }

    /// Returns the value of the first `sub` claim.
    #[must_use]
    pub fn subject_id(&self) -> Option<&str> {
        self.find_first(SUBJECT_CLAIM).map(|c| c.value.as_str())
    }
}

/// State of a device authorization request.
///
/// Stored serialized inside a device flow record; the record's subject id
/// mirrors the principal once the user has authorized the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCode {
    pub client_id: String,

    #[serde(with = "time::serde::rfc3339")]
    pub creation_time: OffsetDateTime,

    /// Lifetime in seconds, counted from `creation_time`.
    pub lifetime: u32,

    #[serde(default)]
    pub is_open_id: bool,

    #[serde(default)]
    pub is_authorized: bool,

    #[serde(default)]
    pub requested_scopes: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized_scopes: Option<Vec<String>>,

    /// User who authorized the device (None until authorized).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<ClaimsPrincipal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DeviceCode {
    /// Point in time at which the code stops being valid.
    ///
    /// `None` if the lifetime runs past the last representable date.
    #[must_use]
    pub fn expiration(&self) -> Option<OffsetDateTime> {
        self.creation_time
            .checked_add(time::Duration::seconds(i64::from(self.lifetime)))
    }

    /// Subject id of the authorizing user, if any.
    #[must_use]
    pub fn subject_id(&self) -> Option<&str> {
        self.subject.as_ref().and_then(ClaimsPrincipal::subject_id)
    }
}
