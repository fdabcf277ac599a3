//! # Nightfall
//!
//! Server for a hidden-role game of bandits, townsfolk and the night.
//!
//! Players stage night actions, the host advances the phase, and the
//! engine resolves who died. This crate puts the engine behind a WebSocket:
//! clients send `Envelope<Request>` frames and get `Envelope<Response>`
//! frames back with the same `seq`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nightfall::prelude::*;
//!
//! # async fn run() -> Result<(), NightfallError> {
//! let store = MemoryLobbyStore::new();
//! store
//!     .insert(
//!         Lobby::new("wolf", "host")
//!             .with_player("a", "Ada")
//!             .with_player("b", "Bo")
//!             .with_role(Role::Gunman, 1)
//!             .with_role(Role::Townsfolk, 1),
//!     )
//!     .await?;
//!
//! let server = NightfallServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(GameService::new(store))
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod connection;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use connection::ConnectionId;
pub use error::NightfallError;
pub use server::{NightfallServer, NightfallServerBuilder};

/// Everything needed to run a server or talk to one.
pub mod prelude {
    pub use crate::{NightfallError, NightfallServer, NightfallServerBuilder, ServerConfig};
    pub use nightfall_engine::{GameConfig, GameError, GameService, SheriffFeedback};
    pub use nightfall_lobby::{Lobby, LobbyStore, MemoryLobbyStore, Player, Role, Team};
    pub use nightfall_protocol::{
        ActionKind, ActionOutcome, Codec, Envelope, ErrorKind, InvestigationResult, JsonCodec,
        LobbyCode, Phase, PlayerId, Request, Response,
    };
}
