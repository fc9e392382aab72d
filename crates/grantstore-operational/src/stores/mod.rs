//! Document-session backed implementations of the storage traits.

mod device_flow;
mod persisted_grant;

pub use device_flow::DeviceFlowStore;
pub use persisted_grant::PersistedGrantStore;

use time::{OffsetDateTime, UtcOffset};

/// Expiration as written to document metadata.
pub(crate) fn to_utc(at: OffsetDateTime) -> OffsetDateTime {
    at.to_offset(UtcOffset::UTC)
}
