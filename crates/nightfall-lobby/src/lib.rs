//! Lobby data model and storage for Nightfall.
//!
//! One [`Lobby`] record holds everything about a game: its players, the
//! configured role pool, the day/night phase, and the per-role
//! [`RoundState`] that night actions are staged into.
//!
//! # Key types
//!
//! - [`Lobby`], [`Player`]: the durable game record
//! - [`Role`], [`Team`], [`Capability`]: the closed role catalogue
//! - [`TeamClassifier`]: maps a role to its team ([`CatalogueTeams`] by default)
//! - [`RoundState`]: typed per-role transient records
//! - [`LobbyStore`]: read / partial-update / compare-and-swap boundary
//! - [`MemoryLobbyStore`]: in-process store used by the server and tests

#![allow(async_fn_in_trait)]

mod error;
mod lobby;
mod role;
mod round;
mod store;

pub use error::StoreError;
pub use lobby::{Lobby, LobbyStatus, Player, RoleCounts};
pub use role::{CatalogueTeams, Capability, Role, Team, TeamClassifier, UnknownRole};
pub use round::{
    ChieftainRecord, GunmanRecord, GunslingerRecord, InnkeeperRecord, PeeperRecord,
    ProstituteRecord, RoundPatch, RoundState, SheriffRecord, Visitor, VISITOR_LABEL,
};
pub use store::{LobbyPatch, LobbyStore, MemoryLobbyStore, Stamp, Versioned};
