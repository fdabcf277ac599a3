//! The lobby record and its players.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use nightfall_protocol::{LobbyCode, Phase, PlayerId};
use serde::{Deserialize, Serialize};

use crate::{Role, RoundState};

/// Required number of holders per role. Sum must equal the player count
/// when the game starts.
pub type RoleCounts = BTreeMap<Role, u32>;

// ---------------------------------------------------------------------------
// LobbyStatus
// ---------------------------------------------------------------------------

/// Whether roles have been dealt yet.
///
/// ```text
/// Waiting ──(start_game)──→ Started
/// ```
///
/// Ending a game belongs to the win-condition evaluator, which lives
/// outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LobbyStatus {
    /// Players are gathering; no roles yet.
    #[default]
    Waiting,
    /// Roles are dealt and the day/night cycle is running.
    Started,
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One seat at the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Dealt once at game start, never changed afterwards.
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default = "alive")]
    pub is_alive: bool,
    /// The role that killed this player. Set once, never cleared.
    #[serde(default)]
    pub killed_by: Option<Role>,
}

fn alive() -> bool {
    true
}

impl Player {
    /// A living player with no role yet.
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: None,
            is_alive: true,
            killed_by: None,
        }
    }

    /// Returns `true` if this player is alive and holds `role`.
    pub fn is_living(&self, role: Role) -> bool {
        self.is_alive && self.role == Some(role)
    }

    /// Marks the player dead. The first killer sticks.
    pub fn kill(&mut self, by: Role) {
        self.is_alive = false;
        if self.killed_by.is_none() {
            self.killed_by = Some(by);
        }
    }
}

// ---------------------------------------------------------------------------
// Lobby
// ---------------------------------------------------------------------------

/// One game session's durable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lobby {
    pub code: LobbyCode,
    /// The only identity allowed to start, advance, or configure the game.
    pub host_id: PlayerId,
    /// Display order; resolution only relies on it for stable indexing.
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub role_counts: RoleCounts,
    #[serde(default)]
    pub status: LobbyStatus,
    #[serde(default)]
    pub phase: Phase,
    #[serde(default = "first_day")]
    pub day_count: u32,
    #[serde(default)]
    pub round: RoundState,
    /// Opaque to the engine; owned by whoever configures the lobby.
    #[serde(default)]
    pub settings: serde_json::Value,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub phase_started_at: Option<DateTime<Utc>>,
}

fn first_day() -> u32 {
    1
}

impl Lobby {
    /// An empty, waiting lobby.
    pub fn new(code: impl Into<LobbyCode>, host_id: impl Into<PlayerId>) -> Self {
        Self {
            code: code.into(),
            host_id: host_id.into(),
            players: Vec::new(),
            role_counts: RoleCounts::new(),
            status: LobbyStatus::Waiting,
            phase: Phase::Night,
            day_count: 1,
            round: RoundState::default(),
            settings: serde_json::Value::Null,
            started_at: None,
            phase_started_at: None,
        }
    }

    /// Builder-style: seat a player.
    pub fn with_player(mut self, id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        self.players.push(Player::new(id, name));
        self
    }

    /// Builder-style: require `count` holders of `role`.
    pub fn with_role(mut self, role: Role, count: u32) -> Self {
        self.role_counts.insert(role, count);
        self
    }

    pub fn is_host(&self, id: &PlayerId) -> bool {
        self.host_id == *id
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    /// The living player holding `role`, if any. Roles are unique per
    /// game, so there is at most one.
    pub fn living_holder(&self, role: Role) -> Option<&Player> {
        self.players.iter().find(|p| p.is_living(role))
    }

    /// Total size of the configured role pool.
    pub fn role_pool_size(&self) -> usize {
        self.role_counts.values().map(|&n| n as usize).sum()
    }
}
