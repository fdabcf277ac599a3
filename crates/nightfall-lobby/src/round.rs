//! Per-role round-state: what each actionable role has staged for the
//! current night, plus the few counters that persist across nights.
//!
//! Each role owns exactly one record. Intake writes replace a single
//! record through a [`RoundPatch`], so two different roles staging at the
//! same time never overwrite each other.

use nightfall_protocol::{InvestigationResult, PlayerId};
use serde::{Deserialize, Serialize};

/// The only label a Peeper ever sees for a visitor. The visitor's role is
/// never reported.
pub const VISITOR_LABEL: &str = "visitor";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GunmanRecord {
    pub target_id: Option<PlayerId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChieftainRecord {
    pub target_id: Option<PlayerId>,
    /// Whether a Gunman was alive when the order was given. Resolution
    /// trusts this snapshot and does not look again.
    #[serde(default)]
    pub has_gunman: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnkeeperRecord {
    pub protected_id: Option<PlayerId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProstituteRecord {
    pub blocked_id: Option<PlayerId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheriffRecord {
    pub target_id: Option<PlayerId>,
    /// Last investigation result; survives the night unless the Sheriff
    /// turns out to have been blocked.
    pub result: Option<InvestigationResult>,
}

/// Someone who visited the watched player, stripped of their role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visitor {
    pub id: PlayerId,
    pub name: String,
    pub label: String,
}

impl Visitor {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            label: VISITOR_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeeperRecord {
    pub watch_id: Option<PlayerId>,
    /// Filled in by night resolution, emptied when a new night begins.
    #[serde(default)]
    pub visitors: Vec<Visitor>,
    pub watch_result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GunslingerRecord {
    pub bullets_remaining: u8,
    /// Set once a Town player has been shot; forfeits the last bullet.
    #[serde(default)]
    pub killed_town: bool,
    pub last_target: Option<PlayerId>,
}

impl GunslingerRecord {
    /// A fresh holster.
    pub fn loaded(bullets: u8) -> Self {
        Self {
            bullets_remaining: bullets,
            killed_town: false,
            last_target: None,
        }
    }
}

// ---------------------------------------------------------------------------
// RoundState
// ---------------------------------------------------------------------------

/// All role records of one lobby. An absent record means the role is not
/// in play or has not acted yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    #[serde(default)]
    pub gunman: Option<GunmanRecord>,
    #[serde(default)]
    pub chieftain: Option<ChieftainRecord>,
    #[serde(default)]
    pub innkeeper: Option<InnkeeperRecord>,
    #[serde(default)]
    pub prostitute: Option<ProstituteRecord>,
    #[serde(default)]
    pub sheriff: Option<SheriffRecord>,
    #[serde(default)]
    pub peeper: Option<PeeperRecord>,
    #[serde(default)]
    pub gunslinger: Option<GunslingerRecord>,
}

impl RoundState {
    /// Replaces every record the patch carries; leaves the rest alone.
    pub fn apply(&mut self, patch: RoundPatch) {
        let RoundPatch {
            gunman,
            chieftain,
            innkeeper,
            prostitute,
            sheriff,
            peeper,
            gunslinger,
        } = patch;
        if gunman.is_some() {
            self.gunman = gunman;
        }
        if chieftain.is_some() {
            self.chieftain = chieftain;
        }
        if innkeeper.is_some() {
            self.innkeeper = innkeeper;
        }
        if prostitute.is_some() {
            self.prostitute = prostitute;
        }
        if sheriff.is_some() {
            self.sheriff = sheriff;
        }
        if peeper.is_some() {
            self.peeper = peeper;
        }
        if gunslinger.is_some() {
            self.gunslinger = gunslinger;
        }
    }
}

/// Record-level replacements for a [`RoundState`]. `None` leaves a record
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundPatch {
    pub gunman: Option<GunmanRecord>,
    pub chieftain: Option<ChieftainRecord>,
    pub innkeeper: Option<InnkeeperRecord>,
    pub prostitute: Option<ProstituteRecord>,
    pub sheriff: Option<SheriffRecord>,
    pub peeper: Option<PeeperRecord>,
    pub gunslinger: Option<GunslingerRecord>,
}

impl RoundPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A patch that rewrites every record present in `state`.
impl From<RoundState> for RoundPatch {
    fn from(state: RoundState) -> Self {
        Self {
            gunman: state.gunman,
            chieftain: state.chieftain,
            innkeeper: state.innkeeper,
            prostitute: state.prostitute,
            sheriff: state.sheriff,
            peeper: state.peeper,
            gunslinger: state.gunslinger,
        }
    }
}
