//! Wire protocol for Codebreaker.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Events** ([`ClientEvent`], [`ServerEvent`]): one tagged JSON
//!   object per frame.
//! - **Types** ([`PlayerId`], [`RoomId`], [`RoomSettings`], [`Attempt`],
//!   ...): the payloads those events carry.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer knows nothing about connections or rooms.
//!
//! ```text
//! Transport (bytes) → Protocol (events) → Room (game rules)
//! ```

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ClientEvent, ServerEvent};
pub use types::{
    Attempt, EndReason, PlayerId, PlayerResult, PlayerSummary, Recipient,
    RoomId, RoomSettings, SessionStatus, SettingsRequest, VoteEntry,
};
