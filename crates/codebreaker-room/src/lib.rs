//! Rooms, game sessions and rematches for Codebreaker.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! members, its game session and its timers.
//!
//! # Key types
//!
//! - [`RoomDirectory`]: creates, finds and deletes rooms
//! - [`RoomHandle`]: sends commands to a running room actor
//! - [`PlayerAction`]: gameplay requests from a room member
//! - [`RoomConfig`]: capacity, grace periods, rematch rules
//! - [`RoomError`]: everything a room can refuse
//!
//! # Scoring
//!
//! [`score_guess`] is the feedback rule shared by every session: exact
//! hits first, then leftover digits matched anywhere.

mod config;
mod error;
mod game;
mod manager;
mod rematch;
mod room;
mod scoring;

pub use config::{DIGIT_COUNT_RANGE, MAX_ATTEMPTS_RANGE, RoomConfig, validate_settings};
pub use error::RoomError;
pub use manager::{RoomDirectory, generate_room_code};
pub use room::{PlayerAction, PlayerSender, RoomHandle, RoomInfo};
pub use scoring::{Score, generate_secret, score_guess};
