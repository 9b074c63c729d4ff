//! Per-connection handler: decode, resolve the sender, route to a room.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The task owns the connection's outbound queue: rooms push
//! [`ServerEvent`]s into it and the task writes them to the socket in
//! order, interleaved with reading inbound frames.
//!
//! Room membership events (`create_room`, `join_room`, `reconnect`,
//! `leave_room`) change the connection's binding in the registry. A
//! `join_room` or `reconnect` leaves the current room only once the target
//! room has accepted; a rejected attempt keeps the old seat. Every
//! other event is resolved through that binding and forwarded to the
//! room as a [`PlayerAction`].

use std::sync::Arc;

use codebreaker_protocol::{ClientEvent, Codec, PlayerId, RoomId, ServerEvent};
use codebreaker_room::{PlayerAction, PlayerSender, RoomError};
use codebreaker_session::PlayerBinding;
use codebreaker_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::CodebreakerError;
use crate::server::ServerState;

/// Reports the connection's player as disconnected when the handler exits.
///
/// Runs even if the handler panics. `Drop` is synchronous, so the async
/// cleanup is spawned as a fire-and-forget task.
struct ConnectionGuard<C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let binding = state.connections.lock().await.unregister(conn_id);
            let Some(binding) = binding else {
                return;
            };
            tracing::info!(%conn_id, player_id = %binding.player_id, "connection lost");
            if let Some(room) = state.rooms.get(&binding.room_id) {
                let _ = room.disconnect(binding.player_id).await;
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), CodebreakerError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let (sender, mut outbound) = mpsc::unbounded_channel::<ServerEvent>();
    let _guard = ConnectionGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    loop {
        tokio::select! {
            inbound = conn.recv() => match inbound {
                Ok(Some(data)) => dispatch(&state, conn_id, &sender, &data).await,
                Ok(None) => {
                    tracing::debug!(%conn_id, "connection closed cleanly");
                    break;
                }
                Err(e) => {
                    tracing::warn!(%conn_id, error = %e, "recv error");
                    break;
                }
            },
            Some(event) = outbound.recv() => {
                if matches!(event, ServerEvent::KickedFromRoom { .. }) {
                    state.connections.lock().await.unregister(conn_id);
                }
                let bytes = state.codec.encode(&event)?;
                conn.send(&bytes).await?;
            }
        }
    }

    // _guard drops here → the room hears about the disconnect.
    Ok(())
}

/// Decodes one inbound frame and acts on it.
///
/// Malformed frames are logged and dropped without a reply.
async fn dispatch<C: Codec>(
    state: &ServerState<C>,
    conn_id: ConnectionId,
    sender: &PlayerSender,
    data: &[u8],
) {
    let event = match state
        .codec
        .decode::<ClientEvent>(data)
        .and_then(|event| event.validate().map(|()| event))
    {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(%conn_id, error = %e, "discarding malformed event");
            return;
        }
    };
    tracing::debug!(%conn_id, kind = event.kind(), "event received");

    match event {
        ClientEvent::CreateRoom { player_name } => {
            leave_current_room(state, conn_id).await;
            let (room_id, player_id) = state.rooms.create_room(player_name.clone(), sender.clone());
            bind(
                state,
                conn_id,
                PlayerBinding {
                    player_id,
                    room_id,
                    player_name,
                },
            )
            .await;
        }

        ClientEvent::JoinRoom {
            room_id,
            player_name,
        } => {
            let result = match state.rooms.get(&room_id) {
                Some(room) => room.join(player_name.clone(), sender.clone()).await,
                None => Err(RoomError::RoomNotFound(room_id.clone())),
            };
            match result {
                Ok(player_id) => {
                    leave_current_room(state, conn_id).await;
                    let binding = PlayerBinding {
                        player_id,
                        room_id,
                        player_name,
                    };
                    bind(state, conn_id, binding).await;
                }
                Err(e) => reject(sender, conn_id, e),
            }
        }

        ClientEvent::Reconnect {
            room_id,
            player_id,
            player_name,
        } => {
            let result = match state.rooms.get(&room_id) {
                Some(room) => {
                    room.reconnect(player_id.clone(), player_name.clone(), sender.clone())
                        .await
                }
                None => Err(RoomError::RoomNotFound(room_id.clone())),
            };
            match result {
                Ok(()) => {
                    leave_current_room(state, conn_id).await;
                    let binding = PlayerBinding {
                        player_id,
                        room_id,
                        player_name,
                    };
                    bind(state, conn_id, binding).await;
                }
                Err(e) => reject(sender, conn_id, e),
            }
        }

        ClientEvent::LeaveRoom => leave_current_room(state, conn_id).await,

        other => {
            let Some(action) = into_action(other) else {
                return;
            };
            let binding = state.connections.lock().await.lookup(conn_id).cloned();
            let Some(binding) = binding else {
                tracing::debug!(%conn_id, "action from connection outside any room");
                return;
            };
            route(state, conn_id, &binding.room_id, binding.player_id, action).await;
        }
    }
}

/// Maps gameplay events onto room actions.
fn into_action(event: ClientEvent) -> Option<PlayerAction> {
    let action = match event {
        ClientEvent::UpdateSettings { settings } => PlayerAction::UpdateSettings(settings),
        ClientEvent::StartGame => PlayerAction::StartGame,
        ClientEvent::SubmitGuess { guess } => PlayerAction::SubmitGuess(guess),
        ClientEvent::RequestAttemptDetails { target_player_id } => {
            PlayerAction::RequestAttemptDetails(target_player_id)
        }
        ClientEvent::RequestRematch => PlayerAction::RequestRematch,
        ClientEvent::RematchVote { accepted } => PlayerAction::RematchVote(accepted),
        ClientEvent::CreateRoom { .. }
        | ClientEvent::JoinRoom { .. }
        | ClientEvent::Reconnect { .. }
        | ClientEvent::LeaveRoom => return None,
    };
    Some(action)
}

async fn route<C: Codec>(
    state: &ServerState<C>,
    conn_id: ConnectionId,
    room_id: &RoomId,
    player_id: PlayerId,
    action: PlayerAction,
) {
    let Some(room) = state.rooms.get(room_id) else {
        tracing::debug!(%conn_id, %room_id, "bound room is gone");
        state.connections.lock().await.unregister(conn_id);
        return;
    };
    if let Err(e) = room.act(player_id, action).await {
        tracing::debug!(%conn_id, %room_id, error = %e, "room stopped before action");
    }
}

async fn bind<C: Codec>(state: &ServerState<C>, conn_id: ConnectionId, binding: PlayerBinding) {
    tracing::info!(
        %conn_id,
        player_id = %binding.player_id,
        room_id = %binding.room_id,
        player_name = %binding.player_name,
        "player bound to room"
    );
    state.connections.lock().await.register(conn_id, binding);
}

/// Leaves whatever room the connection is in, if any.
async fn leave_current_room<C: Codec>(state: &ServerState<C>, conn_id: ConnectionId) {
    let binding = state.connections.lock().await.unregister(conn_id);
    let Some(binding) = binding else {
        return;
    };
    if let Some(room) = state.rooms.get(&binding.room_id) {
        let _ = room.leave(binding.player_id).await;
    }
}

fn reject(sender: &PlayerSender, conn_id: ConnectionId, err: RoomError) {
    tracing::debug!(%conn_id, error = %err, "request rejected");
    let _ = sender.send(ServerEvent::error(&err));
}
