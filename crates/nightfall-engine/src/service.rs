//! The game service: runs caller-facing operations against a lobby store.
//!
//! Every operation follows the same shape:
//!
//! ```text
//!   get(code) ──→ plan (pure rules) ──→ update(patch, expected?)
//!       ▲                                     │
//!       └────────── Conflict, retries left ───┘
//! ```
//!
//! The rule modules decide whether a write must be conditional. Staging
//! writes merge one role record without a revision check, but the store
//! drops them if the night they were checked against has ended; starting
//! the game, advancing the phase and Gunslinger shots are written only if
//! nobody else wrote since the read. On a lost race the whole operation is
//! re-planned from a fresh read, so every check runs again against the
//! state that will actually be overwritten.

use std::sync::{Mutex, PoisonError};

use nightfall_lobby::{CatalogueTeams, Lobby, LobbyPatch, LobbyStore, StoreError, TeamClassifier, Versioned};
use nightfall_protocol::{LobbyCode, PlayerId, Request, Response};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::intake::{self, ActionReceipt, ActionRequest};
use crate::phase::{PhaseOutcome, plan_transition};
use crate::start::plan_start;
use crate::{GameConfig, GameError};

/// A patch to commit, whether it needs the revision check, and what to
/// hand back once it is written.
struct Plan<R> {
    patch: LobbyPatch,
    conditional: bool,
    value: R,
}

/// Runs game operations against a [`LobbyStore`].
///
/// Holds no per-game state; everything durable lives in the store. Share it
/// behind an `Arc` across connections.
pub struct GameService<S, T = CatalogueTeams> {
    store: S,
    teams: T,
    config: GameConfig,
    /// Only used to deal roles. Never held across an `.await`.
    rng: Mutex<StdRng>,
}

impl<S: LobbyStore> GameService<S> {
    /// A service using the built-in team table and default rules.
    pub fn new(store: S) -> Self {
        Self::with_teams(store, CatalogueTeams, GameConfig::default())
    }
}

impl<S: LobbyStore, T: TeamClassifier> GameService<S, T> {
    pub fn with_teams(store: S, teams: T, config: GameConfig) -> Self {
        Self {
            store,
            teams,
            config,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Replaces the rules.
    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    /// Makes role dealing reproducible.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    // -- Operations ---------------------------------------------------------

    /// Deals roles and starts night 1.
    ///
    /// # Errors
    /// `NotFound`, `Forbidden`, `InvalidPhase` (already started),
    /// `RoleCountMismatch`, or `Internal`.
    pub async fn start_game(&self, code: &LobbyCode, host: &PlayerId) -> Result<(), GameError> {
        let players = self
            .commit(code, "start_game", |lobby| {
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                let patch = plan_start(lobby, host, &mut *rng)?;
                Ok(Plan {
                    patch,
                    conditional: true,
                    value: lobby.players.len(),
                })
            })
            .await?;

        tracing::info!(lobby = %code, players, "game started");
        Ok(())
    }

    /// Flips the phase, resolving the night on the way to day.
    ///
    /// # Errors
    /// `NotFound`, `Forbidden`, `InvalidPhase` (not started), or
    /// `Internal`. On error the phase has not moved.
    pub async fn advance_phase(
        &self,
        code: &LobbyCode,
        host: &PlayerId,
    ) -> Result<PhaseOutcome, GameError> {
        let outcome = self
            .commit(code, "advance_phase", |lobby| {
                let transition = plan_transition(lobby, host, &self.config)?;
                Ok(Plan {
                    patch: transition.patch,
                    conditional: true,
                    value: transition.outcome,
                })
            })
            .await?;

        tracing::info!(
            lobby = %code,
            phase = %outcome.new_phase,
            day = outcome.new_day_count,
            died = ?outcome.report.as_ref().and_then(|r| r.victim()),
            "phase advanced"
        );
        Ok(outcome)
    }

    /// Validates and applies one role action.
    ///
    /// # Errors
    /// `NotFound`, `Forbidden`, `InvalidPhase`, `InvalidTarget`,
    /// `ResourceExhausted`, or `Internal`.
    pub async fn role_action(
        &self,
        code: &LobbyCode,
        request: &ActionRequest,
    ) -> Result<ActionReceipt, GameError> {
        self.commit(code, "role_action", |lobby| {
            let staged = intake::stage(lobby, request, &self.config, &self.teams)?;
            Ok(Plan {
                patch: staged.patch,
                conditional: staged.conditional,
                value: staged.receipt,
            })
        })
        .await
    }

    /// Replaces the lobby's opaque settings.
    ///
    /// # Errors
    /// `NotFound`, `Forbidden`, or `Internal`.
    pub async fn update_settings(
        &self,
        code: &LobbyCode,
        host: &PlayerId,
        settings: serde_json::Value,
    ) -> Result<(), GameError> {
        self.commit(code, "update_settings", |lobby| {
            if !lobby.is_host(host) {
                return Err(GameError::Forbidden("Only host can update settings".into()));
            }
            Ok(Plan {
                patch: LobbyPatch {
                    settings: Some(settings.clone()),
                    ..LobbyPatch::default()
                },
                conditional: false,
                value: (),
            })
        })
        .await?;

        tracing::debug!(lobby = %code, "settings updated");
        Ok(())
    }

    // -- Request dispatch ---------------------------------------------------

    /// Runs a wire request and turns the result into a reply. Never fails;
    /// errors become [`Response::Error`].
    pub async fn handle(&self, request: Request) -> Response {
        let operation = request.operation();
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(operation, error = %err, "request rejected");
                Response::error(err.kind(), err.to_string())
            }
        }
    }

    async fn dispatch(&self, request: Request) -> Result<Response, GameError> {
        match request {
            Request::StartGame { lobby_code, host_id } => {
                let (code, host) = host_request(lobby_code, host_id)?;
                self.start_game(&code, &host).await?;
                Ok(Response::GameStarted {
                    message: "Game started successfully".into(),
                })
            }
            Request::AdvancePhase { lobby_code, host_id } => {
                let (code, host) = host_request(lobby_code, host_id)?;
                let outcome = self.advance_phase(&code, &host).await?;
                Ok(Response::PhaseAdvanced {
                    new_phase: outcome.new_phase,
                    new_day_count: outcome.new_day_count,
                })
            }
            Request::RoleAction {
                action,
                lobby_code,
                actor_id,
                target_id,
            } => {
                let code = lobby_code.map(LobbyCode::from).filter(|c| !c.is_empty());
                let actor = present(actor_id);
                let target = present(target_id);
                let (Some(action), Some(code), Some(actor), Some(target)) =
                    (action, code, actor, target)
                else {
                    return Err(GameError::InvalidRequest("Missing required parameters".into()));
                };
                let receipt = self
                    .role_action(&code, &ActionRequest { action, actor, target })
                    .await?;
                Ok(Response::ActionAccepted {
                    message: receipt.message,
                    outcome: receipt.outcome,
                })
            }
            Request::UpdateSettings {
                lobby_code,
                host_id,
                settings,
            } => {
                let code = lobby_code.map(LobbyCode::from).filter(|c| !c.is_empty());
                let host = present(host_id);
                let settings = settings.filter(|s| !s.is_null());
                let (Some(code), Some(host), Some(settings)) = (code, host, settings) else {
                    return Err(GameError::InvalidRequest(
                        "Missing lobbyCode, hostId, or settings".into(),
                    ));
                };
                self.update_settings(&code, &host, settings).await?;
                Ok(Response::SettingsUpdated {
                    message: "Settings updated".into(),
                })
            }
        }
    }

    // -- Commit loop --------------------------------------------------------

    /// Reads the lobby, plans a write, and commits it. A conditional write
    /// that loses a race is re-planned from a fresh read, up to
    /// `conflict_retries` times.
    async fn commit<R, F>(&self, code: &LobbyCode, operation: &'static str, mut plan: F) -> Result<R, GameError>
    where
        R: Send,
        F: FnMut(&Lobby) -> Result<Plan<R>, GameError> + Send,
    {
        let mut attempt = 0;
        loop {
            let Versioned { lobby, revision } = self.store.get(code).await?;
            let Plan {
                patch,
                conditional,
                value,
            } = plan(&lobby)?;
            let expected = conditional.then_some(revision);

            match self.store.update(code, patch, expected).await {
                Ok(_) => return Ok(value),
                Err(StoreError::Conflict { actual, .. }) if attempt < self.config.conflict_retries => {
                    attempt += 1;
                    tracing::warn!(
                        lobby = %code,
                        operation,
                        attempt,
                        read = revision,
                        actual,
                        "revision conflict, retrying"
                    );
                }
                // The re-plan sees the new phase and refuses the action.
                Err(StoreError::PhaseMoved { actual, .. }) if attempt < self.config.conflict_retries => {
                    attempt += 1;
                    tracing::debug!(lobby = %code, operation, phase = %actual, "phase moved, re-checking");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

fn present(id: Option<String>) -> Option<PlayerId> {
    id.filter(|s| !s.trim().is_empty()).map(PlayerId::from)
}

fn host_request(
    lobby_code: Option<String>,
    host_id: Option<String>,
) -> Result<(LobbyCode, PlayerId), GameError> {
    let code = lobby_code.map(LobbyCode::from).filter(|c| !c.is_empty());
    match (code, present(host_id)) {
        (Some(code), Some(host)) => Ok((code, host)),
        _ => Err(GameError::InvalidRequest("Missing lobbyCode or hostId".into())),
    }
}
