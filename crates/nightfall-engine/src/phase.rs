//! The phase controller: flips night and day.
//!
//! ```text
//!   Night(d) ──resolve night──→ Day(d) ──clear watch──→ Night(d + 1)
//! ```

use nightfall_lobby::{Lobby, LobbyPatch, LobbyStatus, PeeperRecord, RoundPatch, Stamp};
use nightfall_protocol::{Phase, PlayerId};

use crate::resolution::{NightReport, resolve_night};
use crate::{GameConfig, GameError};

/// Where the game stands after a phase change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseOutcome {
    pub new_phase: Phase,
    pub new_day_count: u32,
    /// Present when the transition resolved a night.
    pub report: Option<NightReport>,
}

/// A planned phase change, ready to be written under a revision check.
#[derive(Debug, Clone)]
pub struct PhaseTransition {
    pub patch: LobbyPatch,
    pub outcome: PhaseOutcome,
}

/// Plans the next phase for `lobby`.
///
/// Nothing is written here. Everything the transition changes, the night's
/// deaths included, ends up in the one patch, so a failed write leaves the
/// lobby exactly as it was.
///
/// # Errors
/// `Forbidden` unless `host` is the lobby's host; `InvalidPhase` if the
/// game has not started.
pub fn plan_transition(
    lobby: &Lobby,
    host: &PlayerId,
    config: &GameConfig,
) -> Result<PhaseTransition, GameError> {
    if !lobby.is_host(host) {
        return Err(GameError::Forbidden("Only host can advance the phase".into()));
    }
    if lobby.status != LobbyStatus::Started {
        return Err(GameError::InvalidPhase("Game has not started".into()));
    }

    let transition = match lobby.phase {
        Phase::Night => {
            let night = resolve_night(lobby, config);
            PhaseTransition {
                patch: LobbyPatch {
                    players: Some(night.players),
                    phase: Some(Phase::Day),
                    round: RoundPatch::from(night.round),
                    stamps: vec![Stamp::PhaseStartedAt],
                    ..LobbyPatch::default()
                },
                outcome: PhaseOutcome {
                    new_phase: Phase::Day,
                    new_day_count: lobby.day_count,
                    report: Some(night.report),
                },
            }
        }
        Phase::Day => {
            let new_day_count = lobby.day_count + 1;
            // A fresh watch each night.
            let peeper = lobby.round.peeper.as_ref().map(|_| PeeperRecord::default());
            PhaseTransition {
                patch: LobbyPatch {
                    phase: Some(Phase::Night),
                    day_count: Some(new_day_count),
                    round: RoundPatch {
                        peeper,
                        ..RoundPatch::default()
                    },
                    stamps: vec![Stamp::PhaseStartedAt],
                    ..LobbyPatch::default()
                },
                outcome: PhaseOutcome {
                    new_phase: Phase::Night,
                    new_day_count,
                    report: None,
                },
            }
        }
    };

    Ok(transition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nightfall_lobby::{GunmanRecord, Role, Visitor};
    use nightfall_protocol::ErrorKind;

    fn started() -> Lobby {
        let mut lobby = Lobby::new("moon", "host")
            .with_player("a", "Ada")
            .with_player("b", "Bo")
            .with_player("c", "Cy");
        lobby.players[0].role = Some(Role::Gunman);
        lobby.players[1].role = Some(Role::Peeper);
        lobby.players[2].role = Some(Role::Townsfolk);
        lobby.status = LobbyStatus::Started;
        lobby
    }

    #[test]
    fn test_only_host_advances() {
        let err = plan_transition(&started(), &"a".into(), &GameConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_unstarted_game_cannot_advance() {
        let mut lobby = started();
        lobby.status = LobbyStatus::Waiting;
        let err = plan_transition(&lobby, &"host".into(), &GameConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPhase);
    }

    #[test]
    fn test_night_to_day_keeps_day_count() {
        let mut lobby = started();
        lobby.round.gunman = Some(GunmanRecord {
            target_id: Some("c".into()),
        });
        let t = plan_transition(&lobby, &"host".into(), &GameConfig::default()).unwrap();
        assert_eq!(t.outcome.new_phase, Phase::Day);
        assert_eq!(t.outcome.new_day_count, 1);
        assert_eq!(t.patch.day_count, None);
        assert_eq!(t.outcome.report.unwrap().victim().map(|id| id.as_str()), Some("c"));
        assert!(!t.patch.players.unwrap()[2].is_alive);
    }

    #[test]
    fn test_day_to_night_clears_watch() {
        let mut lobby = started();
        lobby.phase = Phase::Day;
        lobby.day_count = 2;
        lobby.round.peeper = Some(PeeperRecord {
            watch_id: Some("c".into()),
            visitors: vec![Visitor::new("a".into(), "Ada")],
            watch_result: Some("1 player(s) visited your target.".into()),
        });
        let t = plan_transition(&lobby, &"host".into(), &GameConfig::default()).unwrap();
        assert_eq!(t.outcome.new_phase, Phase::Night);
        assert_eq!(t.outcome.new_day_count, 3);
        assert!(t.outcome.report.is_none());
        assert_eq!(t.patch.round.peeper, Some(PeeperRecord::default()));
        assert!(t.patch.players.is_none());
    }
}
