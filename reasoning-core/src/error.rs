use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ReasoningError>;

/// Error taxonomy for the reasoning core.
///
/// `InputInvalid` and `StateCorrupted` are recovered in place by the caller
/// (a dropped record, a reset track); `ZoneConfigError` is fatal at load;
/// `StoreUnavailable` and `SubscriberSlow` are I/O-boundary conditions
/// surfaced to the server layer.
#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("invalid detection record: {0}")]
    InputInvalid(String),

    #[error("track {track_id} state corrupted: {reason}")]
    StateCorrupted { track_id: u64, reason: String },

    #[error("zone configuration error: {0}")]
    ZoneConfigError(String),

    #[error("event store unavailable")]
    StoreUnavailable,

    #[error("subscriber buffer full, oldest message dropped")]
    SubscriberSlow,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
