//! Unified error type for the Codebreaker server.

use codebreaker_protocol::ProtocolError;
use codebreaker_room::RoomError;
use codebreaker_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps every layer's error.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum CodebreakerError {
    /// Connection, send or receive failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encode or decode failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room refused an operation.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Bad environment configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
