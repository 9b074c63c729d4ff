//! End-to-end tests: real WebSocket clients against a running server.

use std::time::Duration;

use codebreaker::prelude::*;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    let server = CodebreakerServer::builder()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, event: Value) {
    ws.send(Message::Text(event.to_string().into()))
        .await
        .expect("send");
}

/// Next JSON event from the server.
async fn recv(ws: &mut ClientWs) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for an event")
            .expect("stream ended")
            .expect("recv failed");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("server sent invalid JSON");
        }
    }
}

/// Skips events until one of the given kind arrives.
async fn recv_kind(ws: &mut ClientWs, kind: &str) -> Value {
    loop {
        let event = recv(ws).await;
        if event["type"] == kind {
            return event;
        }
    }
}

/// Opens a room as "Ana". Returns the room code and Ana's player id.
async fn create_room(ws: &mut ClientWs) -> (String, String) {
    send(ws, json!({"type": "create_room", "playerName": "Ana"})).await;
    let created = recv_kind(ws, "room_created").await;
    (
        created["roomId"].as_str().unwrap().to_owned(),
        created["playerId"].as_str().unwrap().to_owned(),
    )
}

async fn join_room(ws: &mut ClientWs, room_id: &str, name: &str) -> String {
    send(ws, json!({"type": "join_room", "roomId": room_id, "playerName": name})).await;
    let joined = recv_kind(ws, "room_joined").await;
    joined["playerId"].as_str().unwrap().to_owned()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_create_room_replies_with_code_and_host() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(&mut ws, json!({"type": "create_room", "playerName": "Ana"})).await;
    let created = recv(&mut ws).await;

    assert_eq!(created["type"], "room_created");
    assert_eq!(created["roomId"].as_str().unwrap().len(), 6);
    assert_eq!(created["playerId"].as_str().unwrap().len(), 16);
    assert_eq!(created["hostId"], created["playerId"]);
}

#[tokio::test]
async fn test_join_room_with_lowercase_code() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let (room_id, host_id) = create_room(&mut host).await;

    let mut guest = connect(&addr).await;
    send(
        &mut guest,
        json!({"type": "join_room", "roomId": room_id.to_lowercase(), "playerName": "Ben"}),
    )
    .await;

    let joined = recv(&mut guest).await;
    assert_eq!(joined["type"], "room_joined");
    assert_eq!(joined["roomId"], room_id.as_str());
    assert_eq!(joined["hostId"], host_id.as_str());
    assert_eq!(joined["players"].as_array().unwrap().len(), 2);
    assert_eq!(recv(&mut guest).await["type"], "settings_updated");
    assert_eq!(recv(&mut guest).await["type"], "players_updated");

    let update = recv(&mut host).await;
    assert_eq!(update["type"], "players_updated");
    assert_eq!(update["players"][1]["name"], "Ben");
}

#[tokio::test]
async fn test_join_unknown_room_is_error() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(&mut ws, json!({"type": "join_room", "roomId": "nope42", "playerName": "Ben"})).await;

    let error = recv(&mut ws).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["message"], "Room NOPE42 not found");
}

#[tokio::test]
async fn test_malformed_events_are_ignored() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::Text("not json".into())).await.unwrap();
    send(&mut ws, json!({"type": "no_such_event"})).await;
    send(&mut ws, json!({"type": "submit_guess", "guess": [1, 2, 12, 4]})).await;
    // Well-formed, but this connection is not in a room.
    send(&mut ws, json!({"type": "start_game"})).await;

    let (room_id, _) = create_room(&mut ws).await;
    assert_eq!(room_id.len(), 6);
}

#[tokio::test]
async fn test_update_settings_broadcasts() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let (room_id, _) = create_room(&mut host).await;
    let mut guest = connect(&addr).await;
    join_room(&mut guest, &room_id, "Ben").await;

    send(
        &mut host,
        json!({"type": "update_settings", "settings": {"numDigits": 5, "maxAttempts": 12}}),
    )
    .await;

    for ws in [&mut host, &mut guest] {
        let update = recv_kind(ws, "settings_updated").await;
        assert_eq!(update["settings"], json!({"numDigits": 5, "maxAttempts": 12}));
    }
}

#[tokio::test]
async fn test_full_game_ends_with_results() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let (room_id, host_id) = create_room(&mut host).await;
    let mut guest = connect(&addr).await;
    join_room(&mut guest, &room_id, "Ben").await;

    send(&mut host, json!({"type": "start_game"})).await;
    let started = recv_kind(&mut host, "game_started").await;
    let guest_started = recv_kind(&mut guest, "game_started").await;
    assert_eq!(started["sharedSecret"], guest_started["sharedSecret"]);

    send(
        &mut host,
        json!({"type": "submit_guess", "guess": started["sharedSecret"]}),
    )
    .await;

    let result = recv(&mut host).await;
    assert_eq!(result["type"], "guess_result");
    assert_eq!(result["won"], true);
    assert_eq!(result["correctPositionCount"], 4);

    let attempt = recv(&mut guest).await;
    assert_eq!(attempt["type"], "player_attempt");
    assert_eq!(attempt["playerId"], host_id.as_str());
    assert!(attempt.get("guess").is_none());

    for ws in [&mut host, &mut guest] {
        let results = recv_kind(ws, "game_results").await;
        assert_eq!(results["reason"], "last_player_standing");
        assert_eq!(results["winners"].as_array().unwrap().len(), 2);
    }
}

#[tokio::test]
async fn test_dropped_socket_can_reconnect() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let (room_id, _) = create_room(&mut host).await;
    let mut guest = connect(&addr).await;
    let guest_id = join_room(&mut guest, &room_id, "Ben").await;

    guest.close(None).await.unwrap();
    drop(guest);

    let gone = recv_kind(&mut host, "player_disconnected").await;
    assert_eq!(gone["playerId"], guest_id.as_str());

    let mut back = connect(&addr).await;
    send(
        &mut back,
        json!({"type": "reconnect", "roomId": room_id, "playerId": guest_id, "playerName": "Ben"}),
    )
    .await;

    let rejoined = recv(&mut back).await;
    assert_eq!(rejoined["type"], "room_rejoined");
    assert_eq!(rejoined["playerId"], guest_id.as_str());
    let returned = recv_kind(&mut host, "player_reconnected").await;
    assert_eq!(returned["playerName"], "Ben");
}

#[tokio::test]
async fn test_reconnect_without_pending_seat_is_error() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let (room_id, _) = create_room(&mut host).await;

    let mut stranger = connect(&addr).await;
    send(
        &mut stranger,
        json!({"type": "reconnect", "roomId": room_id, "playerId": "0123456789abcdef", "playerName": "Eve"}),
    )
    .await;

    let error = recv(&mut stranger).await;
    assert_eq!(error["type"], "error");
    assert_eq!(
        error["message"],
        "Player session 0123456789abcdef not found or expired"
    );
}

#[tokio::test]
async fn test_leave_room_frees_connection() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let (room_id, _) = create_room(&mut host).await;
    let mut guest = connect(&addr).await;
    join_room(&mut guest, &room_id, "Ben").await;
    recv_kind(&mut host, "players_updated").await;

    send(&mut guest, json!({"type": "leave_room"})).await;

    let update = recv_kind(&mut host, "players_updated").await;
    assert_eq!(update["players"].as_array().unwrap().len(), 1);

    // The same socket can open a room of its own afterwards.
    let (other_room, _) = create_room(&mut guest).await;
    assert_ne!(other_room, room_id);
}

#[tokio::test]
async fn test_settings_outside_wire_types_get_an_error() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    create_room(&mut host).await;

    let cases = [
        (
            json!({"numDigits": 300, "maxAttempts": 20}),
            "Invalid settings: digit count must be between 3 and 10, got 300",
        ),
        (
            json!({"numDigits": 4, "maxAttempts": -1}),
            "Invalid settings: max attempts must be between 5 and 50, got -1",
        ),
    ];
    for (settings, message) in cases {
        send(&mut host, json!({"type": "update_settings", "settings": settings})).await;
        let error = recv_kind(&mut host, "error").await;
        assert_eq!(error["message"], message);
    }
}

#[tokio::test]
async fn test_failed_join_keeps_current_seat() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let (room_id, _) = create_room(&mut host).await;
    let mut guest = connect(&addr).await;
    let guest_id = join_room(&mut guest, &room_id, "Ben").await;

    send(&mut host, json!({"type": "start_game"})).await;
    let started = recv_kind(&mut host, "game_started").await;
    recv_kind(&mut guest, "game_started").await;

    send(&mut guest, json!({"type": "join_room", "roomId": "ZZZZZZ", "playerName": "Ben"})).await;
    let error = recv(&mut guest).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["message"], "Room ZZZZZZ not found");

    // Still seated and still racing.
    let mut guess: Vec<u64> = started["sharedSecret"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d.as_u64().unwrap())
        .collect();
    guess[0] = (guess[0] + 1) % 10;
    send(&mut guest, json!({"type": "submit_guess", "guess": guess})).await;

    let result = recv(&mut guest).await;
    assert_eq!(result["type"], "guess_result");
    assert_eq!(result["attemptNumber"], 1);

    let attempt = recv(&mut host).await;
    assert_eq!(attempt["type"], "player_attempt");
    assert_eq!(attempt["playerId"], guest_id.as_str());
    assert_eq!(attempt["playerName"], "Ben");
}
