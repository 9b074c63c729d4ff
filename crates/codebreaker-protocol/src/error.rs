//! Error types for the protocol layer.

/// Errors that can occur while turning frames into events and back.
///
/// A `ProtocolError` on an inbound frame never reaches the room: the
/// connection handler logs it and drops the frame.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The frame is not valid JSON, has an unknown `type`, or is missing
    /// required fields.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame decoded but its contents are unusable, e.g. a guess
    /// with a digit above 9.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
