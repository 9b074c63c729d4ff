//! Connection bookkeeping for Codebreaker.
//!
//! The server needs to answer one question for every inbound frame:
//! "which player, in which room, sent this?" This crate answers it:
//!
//! 1. **Registry** ([`ConnectionRegistry`]): connection → player binding.
//! 2. **Identity** ([`generate_player_id`]): fresh player identifiers.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server / handler (above)  ← resolves the sender of each event
//!     ↕
//! Session layer (this crate)
//!     ↕
//! Transport + Protocol (below)  ← ConnectionId, PlayerId, RoomId
//! ```

mod identity;
mod registry;

pub use identity::generate_player_id;
pub use registry::{ConnectionRegistry, PlayerBinding};
