//! Room configuration.

use std::time::Duration;

use codebreaker_protocol::{RoomSettings, SettingsRequest};

use crate::RoomError;

/// Bounds for the host-chosen secret length.
pub const DIGIT_COUNT_RANGE: std::ops::RangeInclusive<u8> = 3..=10;

/// Bounds for the per-player attempt budget.
pub const MAX_ATTEMPTS_RANGE: std::ops::RangeInclusive<u32> = 5..=50;

/// Limits and timings shared by every room a directory creates.
///
/// Tests shrink the durations; the server uses [`RoomConfig::default`].
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Cap on active plus pending-disconnect players.
    pub max_players: usize,

    /// Active players required before the host may start.
    pub min_players_to_start: usize,

    /// How long a disconnected player keeps their seat.
    pub reconnect_grace: Duration,

    /// How long a player who used every attempt is kept around before
    /// end-of-game detection runs again on their behalf.
    pub exhausted_grace: Duration,

    /// Length of the rematch voting window, in seconds.
    pub rematch_countdown_secs: u32,

    /// Accepting votes (host included) needed for a rematch to go ahead.
    pub rematch_min_accepts: usize,

    /// Settings a freshly created room starts with.
    pub default_settings: RoomSettings,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_players: 10,
            min_players_to_start: 2,
            reconnect_grace: Duration::from_secs(5 * 60),
            exhausted_grace: Duration::from_secs(5 * 60),
            rematch_countdown_secs: 10,
            rematch_min_accepts: 2,
            default_settings: RoomSettings::default(),
        }
    }
}

/// Bounds-checks a host's settings request.
///
/// # Errors
/// Returns [`RoomError::InvalidSettings`] naming the offending field.
pub fn validate_settings(request: &SettingsRequest) -> Result<RoomSettings, RoomError> {
    let digit_count = u8::try_from(request.digit_count)
        .ok()
        .filter(|n| DIGIT_COUNT_RANGE.contains(n))
        .ok_or_else(|| {
            RoomError::InvalidSettings(format!(
                "digit count must be between {} and {}, got {}",
                DIGIT_COUNT_RANGE.start(),
                DIGIT_COUNT_RANGE.end(),
                request.digit_count
            ))
        })?;
    let max_attempts = u32::try_from(request.max_attempts)
        .ok()
        .filter(|n| MAX_ATTEMPTS_RANGE.contains(n))
        .ok_or_else(|| {
            RoomError::InvalidSettings(format!(
                "max attempts must be between {} and {}, got {}",
                MAX_ATTEMPTS_RANGE.start(),
                MAX_ATTEMPTS_RANGE.end(),
                request.max_attempts
            ))
        })?;
    Ok(RoomSettings {
        digit_count,
        max_attempts,
    })
}
