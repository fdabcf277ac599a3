//! Per-connection handler: decode requests, run them, reply.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! There is no handshake or session; every request names its lobby and
//! caller, and the game service checks them.
//!
//! ```text
//!   recv ──→ decode Envelope<Request> ──→ GameService::handle ──→ send
//!     ▲                                                            │
//!     └──────────────────────── same seq ──────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Instant;

use nightfall_lobby::LobbyStore;
use nightfall_protocol::{Codec, Envelope, ErrorKind, Request, Response};

use crate::NightfallError;
use crate::connection::Connection;
use crate::server::ServerState;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S, C>(
    mut conn: Connection,
    state: Arc<ServerState<S, C>>,
) -> Result<(), NightfallError>
where
    S: LobbyStore,
    C: Codec,
{
    let conn_id = conn.id();
    let start = Instant::now();
    tracing::debug!(%conn_id, "handling new connection");

    loop {
        let data = match tokio::time::timeout(state.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::debug!(%conn_id, "connection idle, closing");
                let _ = conn.close().await;
                break;
            }
        };

        let (seq, response) = match state.codec.decode::<Envelope<Request>>(&data) {
            Ok(envelope) => {
                let operation = envelope.payload.operation();
                tracing::debug!(%conn_id, seq = envelope.seq, operation, "request");
                (envelope.seq, state.game.handle(envelope.payload).await)
            }
            // Unparseable requests still get an answer; seq 0 since we
            // could not read theirs.
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode envelope");
                (0, Response::error(ErrorKind::InvalidRequest, "Malformed request"))
            }
        };

        let reply = Envelope::new(seq, elapsed_ms(&start), response);
        conn.send(state.codec.encode(&reply)?).await?;
    }

    Ok(())
}

fn elapsed_ms(start: &Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
