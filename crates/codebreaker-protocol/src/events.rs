//! Inbound and outbound events.
//!
//! Every frame is one JSON object tagged by `type`:
//!
//! ```text
//! {"type": "join_room", "roomId": "K7QX2M", "playerName": "Lina"}
//! ```
//!
//! `#[serde(tag = "type")]` makes the enums internally tagged, the
//! variant names become snake_case kinds, and `rename_all_fields` turns
//! every payload field into camelCase, which is what the web client
//! reads and writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Attempt, EndReason, PlayerId, PlayerResult, PlayerSummary, ProtocolError,
    RoomId, RoomSettings, SessionStatus, SettingsRequest, VoteEntry,
};

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Everything a client can ask the server to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Open a new room with the sender as host.
    CreateRoom { player_name: String },

    /// Take a seat in an existing room.
    JoinRoom { room_id: RoomId, player_name: String },

    /// Host only: change digit count / attempt budget.
    UpdateSettings { settings: SettingsRequest },

    /// Host only: generate a secret and start racing.
    StartGame,

    /// Score a guess against the shared secret.
    SubmitGuess { guess: Vec<u8> },

    /// Ask for another player's full guess history.
    RequestAttemptDetails { target_player_id: PlayerId },

    /// Host only: open a rematch vote on a finished game.
    RequestRematch,

    /// Accept or decline a pending rematch.
    RematchVote { accepted: bool },

    /// Reclaim a seat after a dropped connection.
    Reconnect {
        room_id: RoomId,
        player_id: PlayerId,
        player_name: String,
    },

    /// Leave the room for good.
    LeaveRoom,
}

impl ClientEvent {
    /// Short event kind for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "create_room",
            Self::JoinRoom { .. } => "join_room",
            Self::UpdateSettings { .. } => "update_settings",
            Self::StartGame => "start_game",
            Self::SubmitGuess { .. } => "submit_guess",
            Self::RequestAttemptDetails { .. } => "request_attempt_details",
            Self::RequestRematch => "request_rematch",
            Self::RematchVote { .. } => "rematch_vote",
            Self::Reconnect { .. } => "reconnect",
            Self::LeaveRoom => "leave_room",
        }
    }

    /// Boundary checks that serde alone cannot express.
    ///
    /// A guess must be non-empty and made of decimal digits. Settings
    /// bounds are not checked here; the room rejects those with a proper
    /// error event instead of dropping the frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] for an unusable guess.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if let Self::SubmitGuess { guess } = self {
            if guess.is_empty() {
                return Err(ProtocolError::InvalidMessage("empty guess".into()));
            }
            if let Some(bad) = guess.iter().find(|d| **d > 9) {
                return Err(ProtocolError::InvalidMessage(format!(
                    "guess digit out of range: {bad}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Everything the server can tell a client.
///
/// Whether an event is unicast or broadcast is decided by the room, not
/// encoded here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    // -- Membership --
    RoomCreated {
        room_id: RoomId,
        player_id: PlayerId,
        host_id: PlayerId,
    },
    RoomJoined {
        room_id: RoomId,
        player_id: PlayerId,
        host_id: PlayerId,
        players: Vec<PlayerSummary>,
    },
    RoomRejoined {
        room_id: RoomId,
        player_id: PlayerId,
        host_id: PlayerId,
        players: Vec<PlayerSummary>,
    },
    PlayersUpdated {
        players: Vec<PlayerSummary>,
        host_id: PlayerId,
    },
    HostChanged {
        new_host_id: PlayerId,
    },
    SettingsUpdated {
        settings: RoomSettings,
    },
    PlayerDisconnected {
        player_id: PlayerId,
        player_name: String,
    },
    PlayerReconnected {
        player_id: PlayerId,
        player_name: String,
    },
    PlayerTimeout {
        player_id: PlayerId,
        player_name: String,
    },
    PlayerQuit {
        player_id: PlayerId,
        player_name: String,
    },
    KickedFromRoom {
        message: String,
    },

    // -- Gameplay --
    GameStarted {
        shared_secret: Vec<u8>,
        settings: RoomSettings,
    },
    /// Session snapshot for a reconnecting player.
    GameState {
        shared_secret: Vec<u8>,
        status: SessionStatus,
        settings: RoomSettings,
        #[serde(with = "chrono::serde::ts_milliseconds")]
        game_start_time: DateTime<Utc>,
    },
    /// The reconnecting player's own progress.
    PlayerGameState {
        attempts: Vec<Attempt>,
        finished: bool,
        won: bool,
    },
    GuessResult {
        guess: Vec<u8>,
        correct_count: usize,
        correct_position_count: usize,
        won: bool,
        attempt_number: usize,
    },
    /// Another player guessed. Carries neither the guess nor its score.
    PlayerAttempt {
        player_id: PlayerId,
        player_name: String,
        attempt_number: usize,
        won: bool,
    },
    MaxAttemptsReached {
        message: String,
    },
    GameResults {
        winners: Vec<PlayerResult>,
        losers: Vec<PlayerResult>,
        still_playing: Vec<PlayerResult>,
        shared_secret: Vec<u8>,
        reason: EndReason,
    },
    PlayerDetails {
        player_id: PlayerId,
        player_name: String,
        attempts: Vec<Attempt>,
        duration: u64,
    },

    // -- Rematch --
    RematchRequested {
        countdown: u32,
    },
    RematchCountdown {
        countdown: u32,
        votes: Vec<VoteEntry>,
    },
    RematchVoteUpdate {
        player_id: PlayerId,
        accepted: bool,
        votes: Vec<VoteEntry>,
    },
    RematchStarting {
        players: Vec<PlayerSummary>,
    },
    RematchCancelled {
        message: String,
    },

    // -- Errors --
    Error {
        message: String,
    },
}

impl ServerEvent {
    /// Builds an `error` event from anything printable.
    pub fn error(message: impl ToString) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }

    /// The wire `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RoomCreated { .. } => "room_created",
            Self::RoomJoined { .. } => "room_joined",
            Self::RoomRejoined { .. } => "room_rejoined",
            Self::PlayersUpdated { .. } => "players_updated",
            Self::HostChanged { .. } => "host_changed",
            Self::SettingsUpdated { .. } => "settings_updated",
            Self::PlayerDisconnected { .. } => "player_disconnected",
            Self::PlayerReconnected { .. } => "player_reconnected",
            Self::PlayerTimeout { .. } => "player_timeout",
            Self::PlayerQuit { .. } => "player_quit",
            Self::KickedFromRoom { .. } => "kicked_from_room",
            Self::GameStarted { .. } => "game_started",
            Self::GameState { .. } => "game_state",
            Self::PlayerGameState { .. } => "player_game_state",
            Self::GuessResult { .. } => "guess_result",
            Self::PlayerAttempt { .. } => "player_attempt",
            Self::MaxAttemptsReached { .. } => "max_attempts_reached",
            Self::GameResults { .. } => "game_results",
            Self::PlayerDetails { .. } => "player_details",
            Self::RematchRequested { .. } => "rematch_requested",
            Self::RematchCountdown { .. } => "rematch_countdown",
            Self::RematchVoteUpdate { .. } => "rematch_vote_update",
            Self::RematchStarting { .. } => "rematch_starting",
            Self::RematchCancelled { .. } => "rematch_cancelled",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> ClientEvent {
        serde_json::from_str(json).expect("valid client event")
    }

    #[test]
    fn test_create_room_decodes_camel_case_fields() {
        let event = decode(r#"{"type":"create_room","playerName":"Lina"}"#);
        assert_eq!(
            event,
            ClientEvent::CreateRoom {
                player_name: "Lina".into()
            }
        );
    }

    #[test]
    fn test_unit_events_decode_from_type_only() {
        assert_eq!(decode(r#"{"type":"start_game"}"#), ClientEvent::StartGame);
        assert_eq!(decode(r#"{"type":"leave_room"}"#), ClientEvent::LeaveRoom);
        assert_eq!(
            decode(r#"{"type":"request_rematch"}"#),
            ClientEvent::RequestRematch
        );
    }

    #[test]
    fn test_reconnect_normalizes_room_id() {
        let event = decode(
            r#"{"type":"reconnect","roomId":"ab12cd","playerId":"f00d","playerName":"Omar"}"#,
        );
        match event {
            ClientEvent::Reconnect { room_id, player_id, .. } => {
                assert_eq!(room_id.as_str(), "AB12CD");
                assert_eq!(player_id.as_str(), "f00d");
            }
            other => panic!("expected Reconnect, got {other:?}"),
        }
    }

    #[test]
    fn test_update_settings_reads_num_digits() {
        let event = decode(
            r#"{"type":"update_settings","settings":{"numDigits":6,"maxAttempts":10}}"#,
        );
        assert_eq!(
            event,
            ClientEvent::UpdateSettings {
                settings: SettingsRequest {
                    digit_count: 6,
                    max_attempts: 10
                }
            }
        );
    }

    #[test]
    fn test_update_settings_keeps_out_of_range_numbers() {
        let event = decode(
            r#"{"type":"update_settings","settings":{"numDigits":300,"maxAttempts":-1}}"#,
        );
        assert_eq!(
            event,
            ClientEvent::UpdateSettings {
                settings: SettingsRequest {
                    digit_count: 300,
                    max_attempts: -1
                }
            }
        );
    }

    #[test]
    fn test_unknown_event_type_is_rejected() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"type":"fly_to_moon"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_non_digit_guess() {
        let event = ClientEvent::SubmitGuess { guess: vec![1, 12, 3] };
        assert!(matches!(
            event.validate(),
            Err(ProtocolError::InvalidMessage(_))
        ));
        let empty = ClientEvent::SubmitGuess { guess: vec![] };
        assert!(empty.validate().is_err());
        let fine = ClientEvent::SubmitGuess { guess: vec![0, 9, 9, 1] };
        assert!(fine.validate().is_ok());
    }

    #[test]
    fn test_server_event_tag_and_fields() {
        let event = ServerEvent::HostChanged {
            new_host_id: PlayerId::new("abc"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::json!({"type":"host_changed","newHostId":"abc"}));
    }

    #[test]
    fn test_guess_result_json_shape() {
        let event = ServerEvent::GuessResult {
            guess: vec![1, 2, 3, 4],
            correct_count: 3,
            correct_position_count: 1,
            won: false,
            attempt_number: 2,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "guess_result");
        assert_eq!(json["correctCount"], 3);
        assert_eq!(json["correctPositionCount"], 1);
        assert_eq!(json["attemptNumber"], 2);
    }

    #[test]
    fn test_game_results_reason_is_snake_case() {
        let event = ServerEvent::GameResults {
            winners: vec![],
            losers: vec![],
            still_playing: vec![],
            shared_secret: vec![4, 2],
            reason: EndReason::LastPlayerStanding,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["reason"], "last_player_standing");
        assert_eq!(json["stillPlaying"], serde_json::json!([]));
        assert_eq!(json["sharedSecret"], serde_json::json!([4, 2]));
    }

    #[test]
    fn test_kind_matches_wire_tag() {
        let events = [
            ServerEvent::error("x"),
            ServerEvent::KickedFromRoom { message: "bye".into() },
            ServerEvent::RematchRequested { countdown: 10 },
            ServerEvent::PlayerGameState { attempts: vec![], finished: false, won: false },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.kind());
        }
    }

    #[test]
    fn test_error_helper() {
        let json = serde_json::to_value(ServerEvent::error("nope")).unwrap();
        assert_eq!(json, serde_json::json!({"type":"error","message":"nope"}));
    }
}
