//! # Codebreaker
//!
//! Real-time multiplayer code-breaking server.
//!
//! Players gather in a room behind a six-character code, the host starts
//! a game, and everyone races to crack the same secret within an attempt
//! budget. Dropped connections get a grace period to come back; finished
//! rooms can vote on a rematch.
//!
//! This crate is the process shell: the WebSocket accept loop, the
//! per-connection dispatcher, and environment configuration. The game
//! rules live in `codebreaker-room`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use codebreaker::prelude::*;
//!
//! # async fn run() -> Result<(), CodebreakerError> {
//! let config = ServerConfig::from_env()?;
//! let server = CodebreakerServer::builder()
//!     .config(&config)
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{ConfigError, ServerConfig};
pub use error::CodebreakerError;
pub use server::{CodebreakerServer, CodebreakerServerBuilder};

/// The types needed to run a server and speak its protocol.
pub mod prelude {
    pub use crate::{CodebreakerError, CodebreakerServer, CodebreakerServerBuilder, ServerConfig};
    pub use codebreaker_protocol::{
        ClientEvent, PlayerId, RoomId, RoomSettings, ServerEvent, SettingsRequest,
    };
    pub use codebreaker_room::{RoomConfig, RoomDirectory};
}
