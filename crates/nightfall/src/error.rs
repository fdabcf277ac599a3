//! Unified error type for the Nightfall server.

use nightfall_engine::GameError;
use nightfall_lobby::StoreError;
use nightfall_protocol::ProtocolError;

/// Top-level error that wraps every layer's error.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum NightfallError {
    /// Socket-level failure (bind, accept, read seed files).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// WebSocket handshake or frame failure.
    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Encode, decode or invalid message.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A game rule refused the operation.
    #[error(transparent)]
    Game(#[from] GameError),

    /// The lobby store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A configuration value could not be used.
    #[error("invalid configuration: {0}")]
    Config(String),
}
