//! The role catalogue: every role a game can deal, its team, and what its
//! night ability does.
//!
//! Roles are a closed enumeration. Nothing downstream compares role names
//! as strings; resolution asks a role for its [`Capability`] and intake asks
//! which role owns an [`ActionKind`].

use std::fmt;
use std::str::FromStr;

use nightfall_protocol::ActionKind;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// Coarse alignment used by investigations and Gunslinger bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Town,
    Bandit,
    Neutral,
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// What a role's ability does to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Stages a night kill (Gunman, Chieftain).
    Killer,
    /// Stages a protection that negates a kill (Innkeeper).
    Protector,
    /// Stages a block that cancels the target's own action (Prostitute).
    Blocker,
    /// Learns the target's alignment at once (Sheriff).
    Investigator,
    /// Learns who visited the target (Peeper).
    Watcher,
    /// Acts immediately, in either phase (Gunslinger).
    InstantActor,
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// A role that can be dealt to a player.
///
/// Serialized by display name, so `Role::SerialKiller` is `"Serial Killer"`
/// both on the wire and as a `roleCounts` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Townsfolk,
    Sheriff,
    Innkeeper,
    Prostitute,
    Peeper,
    Gunslinger,
    Gunman,
    Chieftain,
    #[serde(rename = "Serial Killer")]
    SerialKiller,
    Arsonist,
    Witch,
}

impl Role {
    /// Every role in the catalogue.
    pub const ALL: [Role; 11] = [
        Role::Townsfolk,
        Role::Sheriff,
        Role::Innkeeper,
        Role::Prostitute,
        Role::Peeper,
        Role::Gunslinger,
        Role::Gunman,
        Role::Chieftain,
        Role::SerialKiller,
        Role::Arsonist,
        Role::Witch,
    ];

    /// Display name; also the label written to `killed_by`.
    pub fn name(self) -> &'static str {
        match self {
            Role::Townsfolk => "Townsfolk",
            Role::Sheriff => "Sheriff",
            Role::Innkeeper => "Innkeeper",
            Role::Prostitute => "Prostitute",
            Role::Peeper => "Peeper",
            Role::Gunslinger => "Gunslinger",
            Role::Gunman => "Gunman",
            Role::Chieftain => "Chieftain",
            Role::SerialKiller => "Serial Killer",
            Role::Arsonist => "Arsonist",
            Role::Witch => "Witch",
        }
    }

    /// The catalogue's own team assignment.
    pub fn team(self) -> Team {
        match self {
            Role::Townsfolk
            | Role::Sheriff
            | Role::Innkeeper
            | Role::Prostitute
            | Role::Peeper
            | Role::Gunslinger => Team::Town,
            Role::Gunman | Role::Chieftain => Team::Bandit,
            Role::SerialKiller | Role::Arsonist | Role::Witch => Team::Neutral,
        }
    }

    /// The role's ability, if it has one the engine resolves.
    pub fn capability(self) -> Option<Capability> {
        match self {
            Role::Gunman | Role::Chieftain => Some(Capability::Killer),
            Role::Innkeeper => Some(Capability::Protector),
            Role::Prostitute => Some(Capability::Blocker),
            Role::Sheriff => Some(Capability::Investigator),
            Role::Peeper => Some(Capability::Watcher),
            Role::Gunslinger => Some(Capability::InstantActor),
            _ => None,
        }
    }

    /// The role that owns an action kind.
    pub fn for_action(action: ActionKind) -> Role {
        match action {
            ActionKind::Protect => Role::Innkeeper,
            ActionKind::Kill => Role::Gunman,
            ActionKind::Investigate => Role::Sheriff,
            ActionKind::Block => Role::Prostitute,
            ActionKind::OrderKill => Role::Chieftain,
            ActionKind::Watch => Role::Peeper,
            ActionKind::Shoot => Role::Gunslinger,
        }
    }

    /// Neutral roles the Sheriff sees as suspicious.
    pub fn is_malicious_neutral(self) -> bool {
        matches!(self, Role::SerialKiller | Role::Arsonist | Role::Witch)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a role name is not in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role {0:?}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.name() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// TeamClassifier
// ---------------------------------------------------------------------------

/// Maps a role to its team.
///
/// A pure, total function over the catalogue. Kept behind a trait so a
/// deployment running a variant ruleset can move roles between teams
/// without touching the engine.
pub trait TeamClassifier: Send + Sync + 'static {
    fn team_of(&self, role: Role) -> Team;
}

/// The classifier built into the catalogue ([`Role::team`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogueTeams;

impl TeamClassifier for CatalogueTeams {
    fn team_of(&self, role: Role) -> Team {
        role.team()
    }
}
