//! `CodebreakerServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → connection registry →
//! room directory.

use std::net::SocketAddr;
use std::sync::Arc;

use codebreaker_protocol::{Codec, JsonCodec};
use codebreaker_room::{RoomConfig, RoomDirectory};
use codebreaker_session::ConnectionRegistry;
use codebreaker_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{CodebreakerError, ServerConfig};

/// State shared by every connection task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) connections: Mutex<ConnectionRegistry>,
    pub(crate) rooms: RoomDirectory,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a server.
///
/// ```rust,no_run
/// # async fn run() -> Result<(), codebreaker::CodebreakerError> {
/// use codebreaker::CodebreakerServer;
///
/// let server = CodebreakerServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct CodebreakerServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
}

impl CodebreakerServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
        }
    }

    /// Takes the bind address from an environment config.
    pub fn config(self, config: &ServerConfig) -> Self {
        self.bind(&config.socket_addr().to_string())
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets capacity, grace periods and defaults for every room.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Binds the listener. Uses `JsonCodec` over WebSocket.
    pub async fn build(self) -> Result<CodebreakerServer<JsonCodec>, CodebreakerError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            connections: Mutex::new(ConnectionRegistry::new()),
            rooms: RoomDirectory::new(self.room_config),
            codec: JsonCodec,
        });

        Ok(CodebreakerServer { transport, state })
    }
}

impl Default for CodebreakerServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound game server. Call [`run()`](Self::run) to start accepting.
pub struct CodebreakerServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl CodebreakerServer<JsonCodec> {
    pub fn builder() -> CodebreakerServerBuilder {
        CodebreakerServerBuilder::new()
    }
}

impl<C: Codec> CodebreakerServer<C> {
    /// The address the listener is bound to. Useful after binding port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// The live room directory.
    pub fn rooms(&self) -> &RoomDirectory {
        &self.state.rooms
    }

    /// Accepts connections and spawns a handler task for each. Runs until
    /// the process is terminated.
    pub async fn run(mut self) -> Result<(), CodebreakerError> {
        tracing::info!("codebreaker server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }
}
