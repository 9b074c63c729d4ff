//! Room directory: creates, finds and deletes rooms by code.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use codebreaker_protocol::{PlayerId, RoomId};
use codebreaker_session::generate_player_id;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;

use crate::room::{Founder, spawn_room};
use crate::{PlayerSender, RoomConfig, RoomHandle};

/// Counter distinguishing room actors, so a stopped actor never removes
/// a newer room that drew the same code.
static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Room codes avoid look-alike characters (no 0/O, 1/I/L).
const ROOM_CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const ROOM_CODE_LENGTH: usize = 6;

/// Generates a random six-character room code.
pub fn generate_room_code() -> RoomId {
    let mut rng = rand::rng();
    let code: String = (0..ROOM_CODE_LENGTH)
        .map(|_| ROOM_CODE_CHARS[rng.random_range(0..ROOM_CODE_CHARS.len())] as char)
        .collect();
    RoomId::parse(&code)
}

/// Every live room, keyed by code.
///
/// Cheap to clone; clones share the same map. Each room actor holds a
/// clone so it can remove itself the moment it empties, without going
/// through whoever owns the server state.
#[derive(Clone)]
pub struct RoomDirectory {
    rooms: Arc<DashMap<RoomId, RoomHandle>>,
    config: RoomConfig,
}

impl RoomDirectory {
    /// Creates an empty directory whose rooms use `config`.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Opens a room with `player_name` as its sole member and host.
    ///
    /// `room_created` is queued on `sender` before this returns. The code
    /// is redrawn until it does not collide with a live room.
    pub fn create_room(
        &self,
        player_name: impl Into<String>,
        sender: PlayerSender,
    ) -> (RoomId, PlayerId) {
        let player_id = generate_player_id();
        let founder = Founder {
            player_id: player_id.clone(),
            player_name: player_name.into(),
            sender,
        };

        loop {
            let room_id = generate_room_code();
            match self.rooms.entry(room_id.clone()) {
                Entry::Occupied(_) => {
                    tracing::debug!(%room_id, "room code collision, retrying");
                }
                Entry::Vacant(slot) => {
                    let handle = spawn_room(
                        room_id.clone(),
                        NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
                        self.config.clone(),
                        self.clone(),
                        founder,
                        DEFAULT_CHANNEL_SIZE,
                    );
                    slot.insert(handle);
                    tracing::info!(%room_id, host_id = %player_id, "room created");
                    return (room_id, player_id);
                }
            }
        }
    }

    /// Looks up a live room. The code is normalized first.
    pub fn get(&self, room_id: &RoomId) -> Option<RoomHandle> {
        let room_id = RoomId::parse(room_id.as_str());
        self.rooms.get(&room_id).map(|entry| entry.value().clone())
    }

    /// Removes a room and shuts its actor down, cancelling its timers.
    ///
    /// Returns `false` if no such room was live.
    pub async fn delete(&self, room_id: &RoomId) -> bool {
        let Some((_, handle)) = self.rooms.remove(room_id) else {
            return false;
        };
        let _ = handle.shutdown().await;
        tracing::info!(%room_id, "room deleted");
        true
    }

    /// Called by a room actor that just emptied.
    pub(crate) fn remove(&self, room_id: &RoomId, instance: u64) {
        self.rooms
            .remove_if(room_id, |_, handle| handle.instance() == instance);
    }

    /// Number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Codes of all live rooms.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.iter().map(|entry| entry.key().clone()).collect()
    }
}
