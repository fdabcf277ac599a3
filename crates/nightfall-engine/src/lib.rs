//! Night action resolution for Nightfall.
//!
//! This is where the rules live. Players stage private night actions
//! through [`intake`]; when the host advances the phase, the
//! [`resolution`] engine turns everything staged into deaths and Peeper
//! reports, and the [`phase`] controller flips day and night.
//!
//! The rule modules are pure: they read a [`Lobby`](nightfall_lobby::Lobby)
//! and return a [`LobbyPatch`](nightfall_lobby::LobbyPatch) plus whatever
//! the caller should hear back. [`GameService`] is the only part that
//! talks to a [`LobbyStore`](nightfall_lobby::LobbyStore), and it commits
//! every read-compute-write under a revision check.
//!
//! # Key types
//!
//! - [`GameService`]: runs the caller-facing operations against a store
//! - [`GameConfig`]: rule knobs (bullets, immune roles, retries)
//! - [`GameError`]: the failure categories callers see
//! - [`NightReport`]: what happened during one resolved night

pub mod intake;
pub mod phase;
pub mod resolution;
pub mod start;

mod config;
mod error;
mod service;

pub use config::{GameConfig, SheriffFeedback};
pub use error::GameError;
pub use intake::{ActionReceipt, ActionRequest};
pub use phase::{PhaseOutcome, PhaseTransition};
pub use resolution::{KillAttempt, KillOutcome, NightReport, NightResolution};
pub use service::GameService;
