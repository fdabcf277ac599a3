//! Core protocol types for Nightfall's wire format.
//!
//! Every type here is serialized to bytes, sent over the network, and
//! decoded on the other side. Field names are `snake_case` and enums are
//! internally tagged with `"type"` so a JavaScript client can switch on a
//! single string.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's identity, stable for the lifetime of a game.
///
/// Ids are issued by whatever authenticates callers (out of scope here), so
/// they are opaque strings. `#[serde(transparent)]` keeps them as plain JSON
/// strings on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Returns the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A lobby's join code.
///
/// Codes are case-insensitive: they are trimmed and uppercased on
/// construction, so `"wolf"` and `" WOLF "` name the same lobby. Deserializing
/// goes through the same normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct LobbyCode(String);

impl LobbyCode {
    /// Normalizes a raw join code.
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    /// Returns the normalized code.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if nothing is left after trimming.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for LobbyCode {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&str> for LobbyCode {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<LobbyCode> for String {
    fn from(code: LobbyCode) -> Self {
        code.0
    }
}

impl fmt::Display for LobbyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Game vocabulary shared with callers
// ---------------------------------------------------------------------------

/// The day/night phase of a running game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Private actions are submitted.
    #[default]
    Night,
    /// Public aftermath.
    Day,
}

impl Phase {
    /// The phase that follows this one.
    pub fn next(self) -> Self {
        match self {
            Self::Night => Self::Day,
            Self::Day => Self::Night,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Night => write!(f, "Night"),
            Self::Day => write!(f, "Day"),
        }
    }
}

/// Which role action a [`Request::RoleAction`] carries.
///
/// Each kind belongs to exactly one role: `protect` is the Innkeeper's,
/// `kill` the Gunman's, `investigate` the Sheriff's, `block` the
/// Prostitute's, `order_kill` the Chieftain's, `watch` the Peeper's and
/// `shoot` the Gunslinger's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Protect,
    Kill,
    Investigate,
    Block,
    OrderKill,
    Watch,
    Shoot,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Protect => "protect",
            Self::Kill => "kill",
            Self::Investigate => "investigate",
            Self::Block => "block",
            Self::OrderKill => "order_kill",
            Self::Watch => "watch",
            Self::Shoot => "shoot",
        };
        f.write_str(name)
    }
}

/// What the Sheriff learns about an investigated player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestigationResult {
    Innocent,
    Suspicious,
}

impl fmt::Display for InvestigationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Innocent => write!(f, "innocent"),
            Self::Suspicious => write!(f, "suspicious"),
        }
    }
}

// ---------------------------------------------------------------------------
// ErrorKind: failure categories surfaced to callers
// ---------------------------------------------------------------------------

/// The category of a failed operation.
///
/// Every failure reaches the caller as one of these plus a message; the
/// category is stable, the message is for humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Missing or malformed required fields.
    InvalidRequest,
    /// The referenced lobby does not exist.
    NotFound,
    /// The caller lacks the identity, role, or aliveness the action needs.
    Forbidden,
    /// The action is not allowed in the current phase.
    InvalidPhase,
    /// The target is missing, dead, or excluded by a self-targeting rule.
    InvalidTarget,
    /// The configured role pool does not match the player count.
    RoleCountMismatch,
    /// A role-specific consumable ran out.
    ResourceExhausted,
    /// Unexpected fault in computation or persistence.
    InternalError,
}

impl ErrorKind {
    /// HTTP-style status code for transports that want one.
    pub fn status(self) -> u16 {
        match self {
            Self::InvalidRequest | Self::InvalidTarget => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::InvalidPhase => 409,
            Self::RoleCountMismatch => 422,
            Self::ResourceExhausted => 429,
            Self::InternalError => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ---------------------------------------------------------------------------
// Request: caller → server
// ---------------------------------------------------------------------------

/// An operation requested by a caller.
///
/// Identifier fields are optional on the wire so that a request with a
/// missing field still decodes and can be rejected with
/// [`ErrorKind::InvalidRequest`] instead of a bare decode failure.
///
/// ```text
/// { "type": "RoleAction", "action": "protect",
///   "lobby_code": "wolf", "actor_id": "p3", "target_id": "p4" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Host assigns roles and starts night 1.
    StartGame {
        #[serde(default)]
        lobby_code: Option<String>,
        #[serde(default)]
        host_id: Option<String>,
    },

    /// Host flips Night → Day (resolving the night) or Day → Night.
    AdvancePhase {
        #[serde(default)]
        lobby_code: Option<String>,
        #[serde(default)]
        host_id: Option<String>,
    },

    /// A player uses their role's ability on a target.
    RoleAction {
        #[serde(default)]
        action: Option<ActionKind>,
        #[serde(default)]
        lobby_code: Option<String>,
        #[serde(default)]
        actor_id: Option<String>,
        #[serde(default)]
        target_id: Option<String>,
    },

    /// Host replaces the lobby's opaque settings blob.
    UpdateSettings {
        #[serde(default)]
        lobby_code: Option<String>,
        #[serde(default)]
        host_id: Option<String>,
        #[serde(default)]
        settings: Option<serde_json::Value>,
    },
}

impl Request {
    /// Short operation name for logs.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::StartGame { .. } => "start_game",
            Self::AdvancePhase { .. } => "advance_phase",
            Self::RoleAction { .. } => "role_action",
            Self::UpdateSettings { .. } => "update_settings",
        }
    }
}

// ---------------------------------------------------------------------------
// Response: server → caller
// ---------------------------------------------------------------------------

/// Extra data some role actions return immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ActionOutcome {
    /// The intent was recorded and resolves at the next day transition.
    Staged,
    /// The Sheriff's result, known at once.
    Investigated { result: InvestigationResult },
    /// The Gunslinger fired; the target is already dead.
    Shot {
        bullets_remaining: u8,
        killed_town: bool,
    },
}

/// The server's reply to one [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    GameStarted {
        message: String,
    },
    PhaseAdvanced {
        new_phase: Phase,
        new_day_count: u32,
    },
    ActionAccepted {
        message: String,
        outcome: ActionOutcome,
    },
    SettingsUpdated {
        message: String,
    },
    /// The operation failed and changed nothing.
    Error {
        kind: ErrorKind,
        code: u16,
        message: String,
    },
}

impl Response {
    /// Builds an error response, filling `code` from the kind.
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Error {
            kind,
            code: kind.status(),
            message: message.into(),
        }
    }

    /// Returns `true` for [`Response::Error`].
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

// ---------------------------------------------------------------------------
// Envelope: the top-level wire format
// ---------------------------------------------------------------------------

/// Frames every payload on the wire.
///
/// Callers pick their own `seq`; the server answers each request with the
/// same `seq` so replies can be matched to requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<P> {
    /// Correlates a reply with its request.
    pub seq: u64,

    /// Milliseconds since the sender started. Informational only.
    #[serde(default)]
    pub timestamp: u64,

    pub payload: P,
}

impl<P> Envelope<P> {
    pub fn new(seq: u64, timestamp: u64, payload: P) -> Self {
        Self {
            seq,
            timestamp,
            payload,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
