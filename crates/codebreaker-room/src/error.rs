//! Error types for the room layer.

use codebreaker_protocol::{PlayerId, RoomId};

/// Everything a room can refuse to do.
///
/// None of these are fatal: the room keeps running and the offending
/// player receives the `Display` text in an `error` event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No room with this id, or its actor already stopped.
    #[error("Room {0} not found")]
    RoomNotFound(RoomId),

    /// Active plus pending-disconnect players already fill the room.
    #[error("Room {0} is full")]
    RoomFull(RoomId),

    #[error("Game already in progress")]
    GameInProgress,

    /// Late joins into a results screen are refused.
    #[error("This game has finished. Please create a new room")]
    GameAlreadyFinished,

    #[error("Only the host can do that")]
    NotHost,

    #[error("Need at least {0} players to start")]
    InsufficientPlayers(usize),

    /// The player already has a verdict in the running session.
    #[error("You have already finished")]
    AlreadyFinished,

    /// No pending disconnect for this player: never disconnected, or the
    /// grace period already ran out.
    #[error("Player session {0} not found or expired")]
    SessionExpired(PlayerId),

    #[error("No rematch requested")]
    NoRematchPending,

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// The action needs a session the player takes part in.
    #[error("You are not in a game")]
    NotInGame,

    #[error("Game is not finished yet")]
    GameNotFinished,

    /// No progress recorded for this player in the session.
    #[error("Unknown player {0}")]
    UnknownPlayer(PlayerId),
}
