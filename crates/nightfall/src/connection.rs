//! One client's WebSocket.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::NightfallError;

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a connection, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// An accepted WebSocket carrying encoded envelopes.
///
/// Owned by exactly one handler task, so no locking.
pub struct Connection {
    id: ConnectionId,
    ws: WebSocketStream<TcpStream>,
}

impl Connection {
    /// Completes the WebSocket upgrade on an accepted socket.
    pub async fn accept(stream: TcpStream) -> Result<Self, NightfallError> {
        let ws = tokio_tungstenite::accept_async(stream).await?;
        let id = ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        Ok(Self { id, ws })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Sends one encoded frame as a text message.
    ///
    /// The wire format is JSON, so frames are valid UTF-8.
    pub async fn send(&mut self, data: Vec<u8>) -> Result<(), NightfallError> {
        let text = String::from_utf8(data).map_err(|e| {
            nightfall_protocol::ProtocolError::InvalidMessage(format!("non-UTF-8 frame: {e}"))
        })?;
        self.ws.send(Message::text(text)).await?;
        Ok(())
    }

    /// Receives the next data frame. `Ok(None)` means the peer closed.
    pub async fn recv(&mut self) -> Result<Option<Vec<u8>>, NightfallError> {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_bytes().to_vec())),
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.to_vec())),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // ping/pong are answered by tungstenite
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    pub async fn close(&mut self) -> Result<(), NightfallError> {
        self.ws.close(None).await?;
        Ok(())
    }
}
