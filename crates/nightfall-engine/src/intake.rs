//! Role action intake: validate one role's request and turn it into a
//! patch.
//!
//! Most actions only stage an intent into the actor's own round-state
//! record; nothing happens until the night is resolved. The Sheriff's
//! investigation is answered immediately, and the Gunslinger's shot kills
//! on the spot.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. actor is a living holder of the role that owns the action
//! 2. the game has started, and it is night (Gunslinger excepted)
//! 3. the target exists and is alive
//! 4. the role's self-targeting rule

use nightfall_lobby::{
    Capability, ChieftainRecord, GunmanRecord, GunslingerRecord, InnkeeperRecord, Lobby,
    LobbyPatch, LobbyStatus, PeeperRecord, Player, ProstituteRecord, Role, RoundPatch,
    SheriffRecord, Team, TeamClassifier,
};
use nightfall_protocol::{ActionKind, ActionOutcome, InvestigationResult, Phase, PlayerId};

use crate::{GameConfig, GameError};

/// A validated-shape role action: every identifier is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub action: ActionKind,
    pub actor: PlayerId,
    pub target: PlayerId,
}

/// What the actor is told when their action is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReceipt {
    pub message: String,
    pub outcome: ActionOutcome,
}

/// The write an accepted action needs.
#[derive(Debug, Clone)]
pub struct Staged {
    pub patch: LobbyPatch,
    pub receipt: ActionReceipt,
    /// `true` when the write must be conditional on the revision the lobby
    /// was read at. Staging writes touch only the actor's own record and
    /// merge without a revision check, guarded only by the night they were
    /// validated in; a Gunslinger shot spends a bullet and kills, so it must
    /// not be applied twice against the same read.
    pub conditional: bool,
}

/// Validates `request` against `lobby` and builds its write.
///
/// # Errors
/// `Forbidden`, `InvalidPhase`, `InvalidTarget` or `ResourceExhausted`,
/// per the checks above.
pub fn stage(
    lobby: &Lobby,
    request: &ActionRequest,
    config: &GameConfig,
    teams: &impl TeamClassifier,
) -> Result<Staged, GameError> {
    let role = Role::for_action(request.action);
    let target = check_preconditions(lobby, request, role)?;

    let staged = match request.action {
        ActionKind::Protect => staged_round(
            RoundPatch {
                innkeeper: Some(InnkeeperRecord {
                    protected_id: Some(target.id.clone()),
                }),
                ..RoundPatch::default()
            },
            "Hosting applied successfully",
        ),
        ActionKind::Kill => staged_round(
            RoundPatch {
                gunman: Some(GunmanRecord {
                    target_id: Some(target.id.clone()),
                }),
                ..RoundPatch::default()
            },
            "Kill target selected successfully",
        ),
        ActionKind::Block => staged_round(
            RoundPatch {
                prostitute: Some(ProstituteRecord {
                    blocked_id: Some(target.id.clone()),
                }),
                ..RoundPatch::default()
            },
            "Block action applied successfully",
        ),
        ActionKind::OrderKill => order_kill(lobby, target),
        ActionKind::Watch => watch(lobby, target),
        ActionKind::Investigate => investigate(target, teams),
        ActionKind::Shoot => shoot(lobby, target, config, teams)?,
    };

    tracing::debug!(
        lobby = %lobby.code,
        actor = %request.actor,
        action = %request.action,
        "role action accepted"
    );
    Ok(staged)
}

/// Returns the target on success.
fn check_preconditions<'a>(
    lobby: &'a Lobby,
    request: &ActionRequest,
    role: Role,
) -> Result<&'a Player, GameError> {
    let actor_ok = lobby
        .player(&request.actor)
        .is_some_and(|actor| actor.is_living(role));
    if !actor_ok {
        return Err(GameError::Forbidden(format!(
            "You are not the {} or not alive",
            role.name().to_lowercase()
        )));
    }

    if lobby.status != LobbyStatus::Started {
        return Err(GameError::InvalidPhase("Game has not started".into()));
    }
    let capability = role.capability();
    if capability != Some(Capability::InstantActor) && lobby.phase != Phase::Night {
        return Err(GameError::InvalidPhase(
            "Action can only be performed at night".into(),
        ));
    }

    let target = lobby
        .player(&request.target)
        .filter(|t| t.is_alive)
        .ok_or_else(|| GameError::InvalidTarget("Target is not alive".into()))?;

    if request.target == request.actor && forbids_self_target(capability) {
        return Err(GameError::InvalidTarget(
            "You cannot target yourself".into(),
        ));
    }

    Ok(target)
}

/// Protecting, blocking and shooting need someone else.
fn forbids_self_target(capability: Option<Capability>) -> bool {
    matches!(
        capability,
        Some(Capability::Protector | Capability::Blocker | Capability::InstantActor)
    )
}

fn staged_round(round: RoundPatch, message: &str) -> Staged {
    Staged {
        patch: LobbyPatch::round_in(Phase::Night, round),
        receipt: ActionReceipt {
            message: message.to_string(),
            outcome: ActionOutcome::Staged,
        },
        conditional: false,
    }
}

fn order_kill(lobby: &Lobby, target: &Player) -> Staged {
    // Snapshot now; resolution does not look for a Gunman again.
    let has_gunman = lobby.living_holder(Role::Gunman).is_some();
    let message = if has_gunman {
        "Kill order issued to gunman"
    } else {
        "Kill target selected (will execute directly)"
    };
    staged_round(
        RoundPatch {
            chieftain: Some(ChieftainRecord {
                target_id: Some(target.id.clone()),
                has_gunman,
            }),
            ..RoundPatch::default()
        },
        message,
    )
}

fn watch(lobby: &Lobby, target: &Player) -> Staged {
    let previous = lobby.round.peeper.clone().unwrap_or_default();
    staged_round(
        RoundPatch {
            peeper: Some(PeeperRecord {
                watch_id: Some(target.id.clone()),
                visitors: Vec::new(),
                ..previous
            }),
            ..RoundPatch::default()
        },
        "Watch target selected successfully",
    )
}

fn investigate(target: &Player, teams: &impl TeamClassifier) -> Staged {
    let result = target
        .role
        .map(|role| investigation_result(role, teams))
        .unwrap_or(InvestigationResult::Innocent);
    Staged {
        patch: LobbyPatch::round_in(
            Phase::Night,
            RoundPatch {
                sheriff: Some(SheriffRecord {
                    target_id: Some(target.id.clone()),
                    result: Some(result),
                }),
                ..RoundPatch::default()
            },
        ),
        receipt: ActionReceipt {
            message: "Investigation complete".into(),
            outcome: ActionOutcome::Investigated { result },
        },
        conditional: false,
    }
}

/// What the Sheriff sees for `role`.
///
/// Bandits are suspicious except the Chieftain, who passes as innocent.
/// Among neutrals only the malicious ones show up.
pub fn investigation_result(role: Role, teams: &impl TeamClassifier) -> InvestigationResult {
    let suspicious = match teams.team_of(role) {
        Team::Bandit => role != Role::Chieftain,
        Team::Neutral => role.is_malicious_neutral(),
        Team::Town => false,
    };
    if suspicious {
        InvestigationResult::Suspicious
    } else {
        InvestigationResult::Innocent
    }
}

fn shoot(
    lobby: &Lobby,
    target: &Player,
    config: &GameConfig,
    teams: &impl TeamClassifier,
) -> Result<Staged, GameError> {
    let holster = lobby
        .round
        .gunslinger
        .clone()
        .unwrap_or_else(|| GunslingerRecord::loaded(config.starting_bullets));

    if holster.bullets_remaining == 0 {
        return Err(GameError::ResourceExhausted(
            "You have no bullets remaining".into(),
        ));
    }
    if holster.killed_town && holster.bullets_remaining <= 1 {
        return Err(GameError::ResourceExhausted(
            "You killed a town member and cannot use your second bullet".into(),
        ));
    }

    let hit_town = target
        .role
        .is_some_and(|role| teams.team_of(role) == Team::Town);
    let holster = GunslingerRecord {
        bullets_remaining: holster.bullets_remaining - 1,
        killed_town: holster.killed_town || hit_town,
        last_target: Some(target.id.clone()),
    };

    let mut players = lobby.players.clone();
    if let Some(victim) = players.iter_mut().find(|p| p.id == target.id) {
        victim.kill(Role::Gunslinger);
    }

    tracing::info!(
        lobby = %lobby.code,
        target = %target.id,
        bullets_remaining = holster.bullets_remaining,
        killed_town = holster.killed_town,
        "gunslinger fired"
    );

    Ok(Staged {
        receipt: ActionReceipt {
            message: "Shot fired successfully".into(),
            outcome: ActionOutcome::Shot {
                bullets_remaining: holster.bullets_remaining,
                killed_town: holster.killed_town,
            },
        },
        patch: LobbyPatch {
            players: Some(players),
            round: RoundPatch {
                gunslinger: Some(holster),
                ..RoundPatch::default()
            },
            ..LobbyPatch::default()
        },
        conditional: true,
    })
}
