//! Bulk selection of persisted grants.

use grantstore_storage::Query;
use serde::{Deserialize, Serialize};

use crate::entities::fields;
use crate::error::OperationalError;

/// Conjunctive equality filter over persisted grants.
///
/// Unset and blank fields are ignored. At least one field must be set: an
/// empty filter would match, and could delete, the whole collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedGrantFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub grant_type: Option<String>,
}

fn set(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl PersistedGrantFilter {
    #[must_use]
    pub fn for_subject(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: Some(subject_id.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn for_client(client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[must_use]
    pub fn with_client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    #[must_use]
    pub fn with_type(mut self, grant_type: impl Into<String>) -> Self {
        self.grant_type = Some(grant_type.into());
        self
    }

    /// Returns `true` if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates().next().is_none()
    }

    /// Rejects a filter with no set fields.
    ///
    /// # Errors
    ///
    /// Returns `OperationalError::Validation` if every field is unset or blank.
    pub fn validate(&self) -> Result<(), OperationalError> {
        if self.is_empty() {
            return Err(OperationalError::validation(
                "no filter values set: one of subject_id, session_id, client_id or type is required",
            ));
        }
        Ok(())
    }

    fn predicates(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (fields::CLIENT_ID, set(&self.client_id)),
            (fields::SESSION_ID, set(&self.session_id)),
            (fields::SUBJECT_ID, set(&self.subject_id)),
            (fields::TYPE, set(&self.grant_type)),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
    }

    /// Composes the conjunctive query over `collection` for the set fields.
    #[must_use]
    pub fn to_query(&self, collection: &str) -> Query {
        self.predicates()
            .fold(Query::collection(collection), |query, (field, value)| {
                query.where_equals(field, value)
            })
    }
}
