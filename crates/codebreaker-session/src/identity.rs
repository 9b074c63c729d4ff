//! Player identifier generation.

use codebreaker_protocol::PlayerId;
use rand::Rng;

/// Generates a random 16-character hex player id (64 bits of entropy).
///
/// The id doubles as the reconnect credential, so it must be hard to
/// guess. Uniqueness within a room is checked by the room itself.
pub fn generate_player_id() -> PlayerId {
    let mut rng = rand::rng();
    let bytes: [u8; 8] = rng.random();
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    PlayerId::new(hex)
}
