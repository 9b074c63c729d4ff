//! Identity and payload types shared by inbound and outbound events.
//!
//! Everything here travels on the wire, so the serde attributes are part
//! of the contract with the browser client: field names are camelCase and
//! timestamps are epoch milliseconds.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque identifier for a player.
///
/// Issued by the server when a player creates or joins a room, and stable
/// across reconnects within that room: a client that lost its connection
/// presents the same `PlayerId` to get its seat (and game progress) back.
///
/// `#[serde(transparent)]` keeps it a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Wraps an already-issued identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A short, human-shareable room code such as `K7QX2M`.
///
/// Codes are case-normalized: anything a client sends is trimmed and
/// upper-cased on the way in, so `" k7qx2m"` finds the same room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Normalizes a raw, user-typed room code.
    pub fn parse(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomId {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<RoomId> for String {
    fn from(id: RoomId) -> Self {
        id.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive an event?
// ---------------------------------------------------------------------------

/// Specifies which active room members receive an outbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every active player in the room.
    All,

    /// One specific player.
    Player(PlayerId),

    /// Everyone except the given player (usually the sender).
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// Settings and session status
// ---------------------------------------------------------------------------

/// Per-room game settings chosen by the host.
///
/// The digit count travels as `numDigits`, the name the web client has
/// always used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    /// Length of the secret code.
    #[serde(rename = "numDigits")]
    pub digit_count: u8,

    /// Guesses each player may submit before losing.
    pub max_attempts: u32,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            digit_count: 4,
            max_attempts: 20,
        }
    }
}

/// Settings as a host sends them, before bounds checking.
///
/// The fields are wide and signed so that any integer a client sends
/// (negative, or too big for [`RoomSettings`]) still decodes and can be
/// answered with an error instead of being dropped as malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    #[serde(rename = "numDigits")]
    pub digit_count: i64,

    pub max_attempts: i64,
}

impl From<RoomSettings> for SettingsRequest {
    fn from(settings: RoomSettings) -> Self {
        Self {
            digit_count: i64::from(settings.digit_count),
            max_attempts: i64::from(settings.max_attempts),
        }
    }
}

/// Where a room's game session is in its lifecycle.
///
/// ```text
/// Waiting ──(host starts)──→ Playing ──(end detected)──→ Finished
/// ```
///
/// `Waiting` only means "no session": a room with no session reports it,
/// and no session is ever in it. The `Waiting → Playing` edge is the room
/// creating a session, which starts directly in `Playing`. There is no way
/// back to `Waiting`: a rematch throws the finished session away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Waiting,
    Playing,
    Finished,
}

impl SessionStatus {
    /// Returns `true` if transitioning to `target` is valid.
    ///
    /// A session itself only ever takes the `Playing → Finished` edge.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Waiting, Self::Playing) | (Self::Playing, Self::Finished)
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// Gameplay payloads
// ---------------------------------------------------------------------------

/// A room member as shown in lobby lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
}

/// One scored guess. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub guess: Vec<u8>,
    /// Digits present anywhere in the secret, positional hits included.
    pub correct_count: usize,
    /// Digits in exactly the right position.
    pub correct_position_count: usize,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// One player's line in the final results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResult {
    pub player_id: PlayerId,
    pub player_name: String,
    /// Number of guesses made.
    pub attempts: usize,
    /// Milliseconds from game start to the player's verdict.
    pub duration: u64,
    pub attempts_details: Vec<Attempt>,
    /// Only winners are ranked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
}

/// Why a session finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Every participant has a verdict.
    AllFinished,
    /// Only one participant was still racing and was declared the winner.
    LastPlayerStanding,
}

/// A rematch vote as reported in tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteEntry {
    pub player_id: PlayerId,
    pub accepted: bool,
}
