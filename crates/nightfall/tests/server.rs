//! Integration tests for the Nightfall server: real sockets, real frames.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use nightfall::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// A two-seat lobby: one Gunslinger, one Townsfolk.
fn duel() -> Lobby {
    Lobby::new("duel", "host")
        .with_player("a", "Ada")
        .with_player("b", "Bo")
        .with_role(Role::Gunslinger, 1)
        .with_role(Role::Townsfolk, 1)
}

/// Starts a server on a random port and returns the address.
async fn start_server(idle: Duration) -> String {
    let store = MemoryLobbyStore::new();
    store.insert(duel()).await.expect("seed lobby");

    let server = NightfallServer::builder()
        .bind("127.0.0.1:0")
        .idle_timeout(idle)
        .build(GameService::new(store).with_seed(3))
        .await
        .expect("server should build");

    let addr = server.local_addr().expect("should have local addr").to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

/// Sends one request and waits for its reply.
async fn call(ws: &mut ClientWs, seq: u64, request: Request) -> Envelope<Response> {
    let bytes = serde_json::to_string(&Envelope::new(seq, 0, request)).expect("encode");
    ws.send(Message::text(bytes)).await.expect("send");
    let msg = ws.next().await.expect("open").expect("recv");
    serde_json::from_slice(&msg.into_data()).expect("decode")
}

fn host_request(code: &str) -> (Option<String>, Option<String>) {
    (Some(code.to_string()), Some("host".to_string()))
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_full_round_over_websocket() {
    let addr = start_server(Duration::from_secs(5)).await;
    let mut ws = connect(&addr).await;

    let (lobby_code, host_id) = host_request("duel");
    let reply = call(&mut ws, 1, Request::StartGame { lobby_code, host_id }).await;
    assert_eq!(reply.seq, 1);
    assert_eq!(
        reply.payload,
        Response::GameStarted {
            message: "Game started successfully".into()
        }
    );

    let (lobby_code, host_id) = host_request("DUEL");
    let reply = call(&mut ws, 2, Request::AdvancePhase { lobby_code, host_id }).await;
    assert_eq!(reply.seq, 2);
    assert_eq!(
        reply.payload,
        Response::PhaseAdvanced {
            new_phase: Phase::Day,
            new_day_count: 1
        }
    );

    // Only one of the two seats holds the gun; the other shot is refused.
    let mut shots = Vec::new();
    for (seq, (actor, target)) in [(3, ("a", "b")), (4, ("b", "a"))] {
        let reply = call(
            &mut ws,
            seq,
            Request::RoleAction {
                action: Some(ActionKind::Shoot),
                lobby_code: Some("duel".into()),
                actor_id: Some(actor.into()),
                target_id: Some(target.into()),
            },
        )
        .await;
        assert_eq!(reply.seq, seq);
        shots.push(reply.payload);
    }
    let accepted: Vec<_> = shots.iter().filter(|r| !r.is_error()).collect();
    assert_eq!(accepted.len(), 1);
    assert_eq!(
        *accepted[0],
        Response::ActionAccepted {
            message: "Shot fired successfully".into(),
            outcome: ActionOutcome::Shot {
                bullets_remaining: 1,
                killed_town: true
            }
        }
    );
}

#[tokio::test]
async fn test_errors_carry_kind_and_status() {
    let addr = start_server(Duration::from_secs(5)).await;
    let mut ws = connect(&addr).await;

    let reply = call(
        &mut ws,
        7,
        Request::AdvancePhase {
            lobby_code: Some("duel".into()),
            host_id: Some("a".into()),
        },
    )
    .await;
    assert_eq!(reply.seq, 7);
    assert_eq!(
        reply.payload,
        Response::Error {
            kind: ErrorKind::Forbidden,
            code: 403,
            message: "Only host can advance the phase".into()
        }
    );

    let (lobby_code, host_id) = host_request("nowhere");
    let reply = call(&mut ws, 8, Request::StartGame { lobby_code, host_id }).await;
    assert!(matches!(
        reply.payload,
        Response::Error {
            kind: ErrorKind::NotFound,
            code: 404,
            ..
        }
    ));
}

#[tokio::test]
async fn test_malformed_frame_gets_invalid_request() {
    let addr = start_server(Duration::from_secs(5)).await;
    let mut ws = connect(&addr).await;

    ws.send(Message::text("{ not json")).await.expect("send");
    let msg = ws.next().await.expect("open").expect("recv");
    let reply: Envelope<Response> = serde_json::from_slice(&msg.into_data()).expect("decode");
    assert_eq!(reply.seq, 0);
    assert!(matches!(
        reply.payload,
        Response::Error {
            kind: ErrorKind::InvalidRequest,
            code: 400,
            ..
        }
    ));

    // The connection survives a bad frame.
    let (lobby_code, host_id) = host_request("duel");
    let reply = call(&mut ws, 9, Request::StartGame { lobby_code, host_id }).await;
    assert!(!reply.payload.is_error());
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let addr = start_server(Duration::from_millis(50)).await;
    let mut ws = connect(&addr).await;

    let next = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("server should close the idle connection");
    match next {
        None | Some(Ok(Message::Close(_))) | Some(Err(_)) => {}
        Some(Ok(other)) => panic!("expected close, got {other:?}"),
    }
}
