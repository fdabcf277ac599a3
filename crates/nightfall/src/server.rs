//! `NightfallServer` builder and server loop.
//!
//! This is the entry point for running a Nightfall game server. It ties
//! together the layers: WebSocket → protocol → game service → lobby store.

use std::sync::Arc;
use std::time::Duration;

use nightfall_engine::GameService;
use nightfall_lobby::LobbyStore;
use nightfall_protocol::{Codec, JsonCodec};
use tokio::net::TcpListener;

use crate::connection::Connection;
use crate::handler::handle_connection;
use crate::{NightfallError, ServerConfig};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<S: LobbyStore, C: Codec> {
    pub(crate) game: GameService<S>,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a Nightfall server.
///
/// # Example
///
/// ```rust,ignore
/// use nightfall::prelude::*;
///
/// let server = NightfallServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(GameService::new(MemoryLobbyStore::new()))
///     .await?;
/// server.run().await
/// ```
pub struct NightfallServerBuilder {
    config: ServerConfig,
}

impl NightfallServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces every setting at once.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets how long a connection may stay silent.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Binds the listener and wraps `game` for sharing across connections.
    ///
    /// Uses `JsonCodec` on the wire.
    pub async fn build<S: LobbyStore>(
        self,
        game: GameService<S>,
    ) -> Result<NightfallServer<S, JsonCodec>, NightfallError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "listening");

        let state = Arc::new(ServerState {
            game,
            codec: JsonCodec,
            idle_timeout: self.config.idle_timeout,
        });

        Ok(NightfallServer { listener, state })
    }
}

impl Default for NightfallServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Nightfall game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct NightfallServer<S: LobbyStore, C: Codec> {
    listener: TcpListener,
    state: Arc<ServerState<S, C>>,
}

impl NightfallServer<nightfall_lobby::MemoryLobbyStore, JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> NightfallServerBuilder {
        NightfallServerBuilder::new()
    }
}

impl<S: LobbyStore, C: Codec> NightfallServer<S, C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop, one handler task per connection. Runs until
    /// the process is terminated.
    pub async fn run(self) -> Result<(), NightfallError> {
        tracing::info!("Nightfall server running");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        let conn = match Connection::accept(stream).await {
                            Ok(conn) => conn,
                            Err(e) => {
                                tracing::debug!(%addr, error = %e, "websocket upgrade failed");
                                return;
                            }
                        };
                        tracing::debug!(conn_id = %conn.id(), %addr, "accepted connection");
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
