//! Storage traits exposed to the token and device flow services.
//!
//! Reads never fail for missing records; absence is `Ok(None)` or an empty
//! vector. Concurrency conflicts on delete and update paths are absorbed by
//! implementations and only logged.

use async_trait::async_trait;

use crate::OperationalResult;
use crate::filter::PersistedGrantFilter;
use crate::models::{DeviceCode, PersistedGrant};

/// Storage trait for persisted grants.
///
/// # Implementations
///
/// - [`PersistedGrantStore`](crate::stores::PersistedGrantStore) over any
///   `DocumentSession`
#[async_trait]
pub trait PersistedGrantStorage: Send + Sync {
    /// Creates the grant, or updates the existing grant with the same key.
    ///
    /// A concurrent write to the same grant wins silently.
    ///
    /// # Errors
    ///
    /// Returns an error if more than one record carries the key or the
    /// storage operation fails.
    async fn store(&self, grant: &PersistedGrant) -> OperationalResult<()>;

    /// Finds a grant by its key.
    async fn get(&self, key: &str) -> OperationalResult<Option<PersistedGrant>>;

    /// Returns every grant matching all set fields of `filter`.
    ///
    /// # Errors
    ///
    /// Returns `OperationalError::Validation` for an empty filter, before
    /// touching storage.
    async fn get_all(&self, filter: &PersistedGrantFilter) -> OperationalResult<Vec<PersistedGrant>>;

    /// Removes the grant with the given key. Absent keys are a no-op.
    async fn remove(&self, key: &str) -> OperationalResult<()>;

    /// Removes every grant matching all set fields of `filter`.
    ///
    /// # Errors
    ///
    /// Returns `OperationalError::Validation` for an empty filter, before
    /// touching storage.
    async fn remove_all(&self, filter: &PersistedGrantFilter) -> OperationalResult<()>;
}

/// Storage trait for device authorization codes.
///
/// # Implementations
///
/// - [`DeviceFlowStore`](crate::stores::DeviceFlowStore) over any
///   `DocumentSession`
#[async_trait]
pub trait DeviceFlowStorage: Send + Sync {
    /// Stores a freshly issued device authorization.
    ///
    /// # Errors
    ///
    /// Returns `OperationalError::Validation` if either code is blank, and a
    /// storage error, including a concurrency conflict, if the commit fails.
    async fn store_device_authorization(
        &self,
        device_code: &str,
        user_code: &str,
        data: &DeviceCode,
    ) -> OperationalResult<()>;

    /// Finds a device authorization by its user code.
    async fn find_by_user_code(&self, user_code: &str) -> OperationalResult<Option<DeviceCode>>;

    /// Finds a device authorization by its device code.
    async fn find_by_device_code(&self, device_code: &str) -> OperationalResult<Option<DeviceCode>>;

    /// Replaces the payload of the authorization issued under `user_code`.
    ///
    /// The device code and creation time of the record are preserved.
    ///
    /// # Errors
    ///
    /// Returns `OperationalError::NotFoundForUpdate` if no authorization was
    /// issued under `user_code`.
    async fn update_by_user_code(&self, user_code: &str, data: &DeviceCode) -> OperationalResult<()>;

    /// Removes the authorization with the given device code. Absent codes
    /// are a no-op.
    async fn remove_by_device_code(&self, device_code: &str) -> OperationalResult<()>;
}
