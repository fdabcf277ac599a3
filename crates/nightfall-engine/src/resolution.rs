//! Night resolution: turn everything staged during a night into deaths,
//! Peeper reports and a cleaned-up round state.
//!
//! Runs once per Night→Day transition, on a snapshot of the lobby. The
//! steps are order-sensitive:
//!
//! ```text
//!   blocks ─→ kill precedence ─→ protection / immunity ─→ intent reset
//!                                                             │
//!                      sheriff feedback ←── peeper visitors ←─┘
//! ```
//!
//! Only living actors count. An intent staged by someone who died before
//! the night ended (a Gunslinger shot, say) does nothing.

use nightfall_lobby::{Lobby, Player, Role, RoundState, Visitor};
use nightfall_protocol::PlayerId;

use crate::{GameConfig, SheriffFeedback};

/// How a resolved kill ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    Killed,
    /// The Innkeeper hosted the target.
    Protected,
    /// The target's role is configured as immune.
    Immune,
}

/// The one kill a night can produce, after precedence and blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillAttempt {
    /// Role label written to the victim's `killed_by`.
    pub killer_role: Role,
    pub killer_id: PlayerId,
    pub target_id: PlayerId,
    pub outcome: KillOutcome,
}

/// What happened during one night. Kept for logs and callers that want
/// more than the new phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NightReport {
    pub kill: Option<KillAttempt>,
    /// Who visited the Peeper's target, in resolution order.
    pub visitors: Vec<Visitor>,
    pub watch_result: Option<String>,
    /// `true` if a blocked Sheriff lost their investigation result.
    pub sheriff_result_cleared: bool,
}

impl NightReport {
    /// The player who died tonight, if anyone did.
    pub fn victim(&self) -> Option<&PlayerId> {
        self.kill
            .as_ref()
            .filter(|k| k.outcome == KillOutcome::Killed)
            .map(|k| &k.target_id)
    }
}

/// The new players and round state to persist, plus the report.
#[derive(Debug, Clone)]
pub struct NightResolution {
    pub players: Vec<Player>,
    pub round: RoundState,
    pub report: NightReport,
}

/// Living role holders and the block, read once from the snapshot.
struct Table<'a> {
    lobby: &'a Lobby,
    blocked: Option<&'a PlayerId>,
}

impl<'a> Table<'a> {
    fn new(lobby: &'a Lobby) -> Self {
        // A dead Prostitute blocks nobody.
        let blocked = lobby
            .living_holder(Role::Prostitute)
            .and(lobby.round.prostitute.as_ref())
            .and_then(|r| r.blocked_id.as_ref());
        Self { lobby, blocked }
    }

    fn holder(&self, role: Role) -> Option<&'a Player> {
        self.lobby.living_holder(role)
    }

    /// The living, unblocked holder of `role`.
    fn free(&self, role: Role) -> Option<&'a Player> {
        self.holder(role).filter(|p| !self.is_blocked(&p.id))
    }

    fn is_blocked(&self, id: &PlayerId) -> bool {
        self.blocked == Some(id)
    }
}

/// Resolves the night staged in `lobby`.
///
/// Pure: nothing is written. The caller persists `players` and `round`
/// together with the phase flip, in one conditional update.
pub fn resolve_night(lobby: &Lobby, config: &GameConfig) -> NightResolution {
    let table = Table::new(lobby);
    let mut players = lobby.players.clone();
    let mut round = lobby.round.clone();
    let mut report = NightReport::default();

    // Kill precedence, then protection. A target shot earlier tonight is
    // already dead and nobody kills them twice.
    let kill = pick_kill(&table)
        .filter(|(_, target_id)| lobby.player(target_id).is_some_and(|p| p.is_alive));
    if let Some((killer, target_id)) = kill {
        let outcome = if protected_by_innkeeper(&table, target_id) {
            KillOutcome::Protected
        } else if config.is_immune(lobby.player(target_id).and_then(|p| p.role)) {
            KillOutcome::Immune
        } else {
            KillOutcome::Killed
        };

        if outcome == KillOutcome::Killed {
            if let Some(victim) = players.iter_mut().find(|p| p.id == *target_id) {
                victim.kill(killer.1);
            }
        }

        tracing::info!(
            lobby = %lobby.code,
            day = lobby.day_count,
            killer = %killer.0.id,
            target = %target_id,
            outcome = ?outcome,
            "night kill resolved"
        );

        report.kill = Some(KillAttempt {
            killer_role: killer.1,
            killer_id: killer.0.id.clone(),
            target_id: target_id.clone(),
            outcome,
        });
    }

    reset_intents(&mut round);

    if let Some(peeper) = round.peeper.as_mut() {
        let watched = table
            .holder(Role::Peeper)
            .and(peeper.watch_id.as_ref());
        if let Some(watched) = watched {
            let visitors = visitors_of(&table, watched, report.kill.as_ref());
            let summary = if visitors.is_empty() {
                "No one visited your target.".to_string()
            } else {
                format!("{} player(s) visited your target.", visitors.len())
            };
            peeper.visitors = visitors.clone();
            peeper.watch_result = Some(summary.clone());
            report.visitors = visitors;
            report.watch_result = Some(summary);
        }
    }

    // Legacy resolution checked the block after it had already been reset,
    // so the result was never cleared and the target stayed staged.
    if let Some(sheriff) = round.sheriff.as_mut() {
        match config.sheriff_feedback {
            SheriffFeedback::Reordered => {
                let blocked = sheriff.target_id.is_some()
                    && table
                        .holder(Role::Sheriff)
                        .is_some_and(|s| table.is_blocked(&s.id));
                if blocked && sheriff.result.take().is_some() {
                    report.sheriff_result_cleared = true;
                }
                sheriff.target_id = None;
            }
            SheriffFeedback::Legacy => {}
        }
    }

    NightResolution {
        players,
        round,
        report,
    }
}

/// Step 2: the Chieftain's order beats the Gunman's own choice. Returns the
/// executor with the role label to blame, and the target.
fn pick_kill<'a>(table: &Table<'a>) -> Option<((&'a Player, Role), &'a PlayerId)> {
    let round = &table.lobby.round;

    let order = round
        .chieftain
        .as_ref()
        .and_then(|r| r.target_id.as_ref().map(|t| (t, r.has_gunman)));
    if let Some((target, has_gunman)) = order {
        if let Some(chieftain) = table.free(Role::Chieftain) {
            if !has_gunman {
                return Some(((chieftain, Role::Chieftain), target));
            }
            // Relayed: only the Gunman can carry it out, and blocking them
            // cancels the order outright.
            return table
                .free(Role::Gunman)
                .map(|gunman| ((gunman, Role::Gunman), target));
        }
    }

    let target = round.gunman.as_ref().and_then(|r| r.target_id.as_ref())?;
    table
        .free(Role::Gunman)
        .map(|gunman| ((gunman, Role::Gunman), target))
}

fn protected_by_innkeeper(table: &Table<'_>, target: &PlayerId) -> bool {
    table.free(Role::Innkeeper).is_some()
        && table
            .lobby
            .round
            .innkeeper
            .as_ref()
            .and_then(|r| r.protected_id.as_ref())
            == Some(target)
}

/// Step 4: one-night intents do not carry over.
fn reset_intents(round: &mut RoundState) {
    if let Some(r) = round.gunman.as_mut() {
        r.target_id = None;
    }
    if let Some(r) = round.chieftain.as_mut() {
        r.target_id = None;
    }
    if let Some(r) = round.innkeeper.as_mut() {
        r.protected_id = None;
    }
    if let Some(r) = round.prostitute.as_mut() {
        r.blocked_id = None;
    }
}

/// Step 5, read from the snapshot taken before the reset. Order: Innkeeper,
/// the executed killer, Sheriff, Prostitute.
fn visitors_of(table: &Table<'_>, watched: &PlayerId, kill: Option<&KillAttempt>) -> Vec<Visitor> {
    let round = &table.lobby.round;
    let mut visitors = Vec::new();
    let mut visit = |player: &Player| visitors.push(Visitor::new(player.id.clone(), &player.name));

    let hosted = round.innkeeper.as_ref().and_then(|r| r.protected_id.as_ref());
    if hosted == Some(watched) {
        if let Some(innkeeper) = table.free(Role::Innkeeper) {
            visit(innkeeper);
        }
    }

    // The executor was already checked for blocks when the kill was picked.
    if let Some(kill) = kill.filter(|k| k.target_id == *watched) {
        if let Some(killer) = table.lobby.player(&kill.killer_id) {
            visit(killer);
        }
    }

    let investigated = round.sheriff.as_ref().and_then(|r| r.target_id.as_ref());
    if investigated == Some(watched) {
        if let Some(sheriff) = table.free(Role::Sheriff) {
            visit(sheriff);
        }
    }

    if table.blocked == Some(watched) {
        if let Some(prostitute) = table.holder(Role::Prostitute) {
            visit(prostitute);
        }
    }

    visitors
}

#[cfg(test)]
mod tests {
    use super::*;
    use nightfall_lobby::{
        ChieftainRecord, GunmanRecord, InnkeeperRecord, LobbyStatus, PeeperRecord,
        ProstituteRecord, SheriffRecord,
    };
    use nightfall_protocol::InvestigationResult;

    /// gm Gunman, ch Chieftain, ik Innkeeper, pr Prostitute, sh Sheriff,
    /// pe Peeper, t1..t3 Townsfolk.
    fn lobby() -> Lobby {
        let seats = [
            ("gm", Role::Gunman),
            ("ch", Role::Chieftain),
            ("ik", Role::Innkeeper),
            ("pr", Role::Prostitute),
            ("sh", Role::Sheriff),
            ("pe", Role::Peeper),
            ("t1", Role::Townsfolk),
            ("t2", Role::Townsfolk),
            ("t3", Role::Townsfolk),
        ];
        let mut lobby = Lobby::new("dusk", "host");
        for (id, role) in seats {
            lobby = lobby.with_player(id, id.to_uppercase());
            if let Some(p) = lobby.players.last_mut() {
                p.role = Some(role);
            }
        }
        lobby.status = LobbyStatus::Started;
        lobby
    }

    fn gunman(lobby: &mut Lobby, target: &str) {
        lobby.round.gunman = Some(GunmanRecord {
            target_id: Some(target.into()),
        });
    }

    fn order(lobby: &mut Lobby, target: &str, has_gunman: bool) {
        lobby.round.chieftain = Some(ChieftainRecord {
            target_id: Some(target.into()),
            has_gunman,
        });
    }

    fn host(lobby: &mut Lobby, target: &str) {
        lobby.round.innkeeper = Some(InnkeeperRecord {
            protected_id: Some(target.into()),
        });
    }

    fn block(lobby: &mut Lobby, target: &str) {
        lobby.round.prostitute = Some(ProstituteRecord {
            blocked_id: Some(target.into()),
        });
    }

    fn watch(lobby: &mut Lobby, target: &str) {
        lobby.round.peeper = Some(PeeperRecord {
            watch_id: Some(target.into()),
            ..PeeperRecord::default()
        });
    }

    fn alive(res: &NightResolution, id: &str) -> bool {
        res.players.iter().any(|p| p.id.as_str() == id && p.is_alive)
    }

    fn resolve(lobby: &Lobby) -> NightResolution {
        resolve_night(lobby, &GameConfig::default())
    }

    #[test]
    fn test_target_shot_earlier_is_not_tonights_kill() {
        let mut lobby = lobby();
        lobby.players[6].kill(Role::Gunslinger);
        gunman(&mut lobby, "t1");

        let res = resolve(&lobby);
        assert!(res.report.kill.is_none());
        assert!(res.report.victim().is_none());
        assert_eq!(res.players[6].killed_by, Some(Role::Gunslinger));
        assert_eq!(res.round.gunman.unwrap().target_id, None);
    }

    #[test]
    fn test_quiet_night() {
        let res = resolve(&lobby());
        assert!(res.report.kill.is_none());
        assert!(res.players.iter().all(|p| p.is_alive));
    }

    #[test]
    fn test_gunman_kill() {
        let mut lobby = lobby();
        gunman(&mut lobby, "t1");
        let res = resolve(&lobby);
        assert!(!alive(&res, "t1"));
        assert_eq!(res.players[6].killed_by, Some(Role::Gunman));
        assert_eq!(res.report.victim(), Some(&PlayerId::from("t1")));
    }

    #[test]
    fn test_order_overrides_gunman_choice() {
        let mut lobby = lobby();
        gunman(&mut lobby, "t2");
        order(&mut lobby, "t1", true);
        let res = resolve(&lobby);
        assert!(!alive(&res, "t1"));
        assert!(alive(&res, "t2"));
        let kill = res.report.kill.unwrap();
        assert_eq!(kill.killer_role, Role::Gunman);
        assert_eq!(kill.killer_id.as_str(), "gm");
    }

    #[test]
    fn test_direct_order_is_blamed_on_chieftain() {
        let mut lobby = lobby();
        order(&mut lobby, "t1", false);
        let res = resolve(&lobby);
        assert_eq!(res.players[6].killed_by, Some(Role::Chieftain));
    }

    #[test]
    fn test_blocked_chieftain_falls_back_to_gunman() {
        let mut lobby = lobby();
        gunman(&mut lobby, "t2");
        order(&mut lobby, "t1", true);
        block(&mut lobby, "ch");
        let res = resolve(&lobby);
        assert!(alive(&res, "t1"));
        assert!(!alive(&res, "t2"));
    }

    #[test]
    fn test_blocked_executor_cancels_kill() {
        let mut lobby = lobby();
        gunman(&mut lobby, "t2");
        order(&mut lobby, "t1", true);
        block(&mut lobby, "gm");
        let res = resolve(&lobby);
        assert!(res.report.kill.is_none());
        assert!(res.players.iter().all(|p| p.is_alive));
    }

    #[test]
    fn test_relayed_order_without_living_gunman_does_nothing() {
        let mut lobby = lobby();
        order(&mut lobby, "t1", true);
        lobby.players[0].kill(Role::Gunslinger);
        let res = resolve(&lobby);
        assert!(res.report.kill.is_none());
        assert!(alive(&res, "t1"));
    }

    #[test]
    fn test_protection_negates_kill() {
        let mut lobby = lobby();
        gunman(&mut lobby, "t1");
        host(&mut lobby, "t1");
        let res = resolve(&lobby);
        assert!(alive(&res, "t1"));
        assert_eq!(res.players[6].killed_by, None);
        assert_eq!(res.report.kill.unwrap().outcome, KillOutcome::Protected);
    }

    #[test]
    fn test_blocked_innkeeper_does_not_protect() {
        let mut lobby = lobby();
        gunman(&mut lobby, "t1");
        host(&mut lobby, "t1");
        block(&mut lobby, "ik");
        assert!(!alive(&resolve(&lobby), "t1"));
    }

    #[test]
    fn test_immune_role_survives() {
        let mut lobby = lobby();
        gunman(&mut lobby, "t1");
        let mut config = GameConfig::default();
        config.immune_roles.insert(Role::Townsfolk);
        let res = resolve_night(&lobby, &config);
        assert!(alive(&res, "t1"));
        assert_eq!(res.report.kill.unwrap().outcome, KillOutcome::Immune);
    }

    #[test]
    fn test_intents_reset() {
        let mut lobby = lobby();
        gunman(&mut lobby, "t1");
        order(&mut lobby, "t2", true);
        host(&mut lobby, "t3");
        block(&mut lobby, "sh");
        let res = resolve(&lobby);
        assert_eq!(res.round.gunman.unwrap().target_id, None);
        assert_eq!(res.round.chieftain.unwrap().target_id, None);
        assert_eq!(res.round.innkeeper.unwrap().protected_id, None);
        assert_eq!(res.round.prostitute.unwrap().blocked_id, None);
    }

    #[test]
    fn test_visitors_in_order_without_roles() {
        let mut lobby = lobby();
        gunman(&mut lobby, "t1");
        host(&mut lobby, "t1");
        block(&mut lobby, "t1");
        lobby.round.sheriff = Some(SheriffRecord {
            target_id: Some("t1".into()),
            result: Some(InvestigationResult::Innocent),
        });
        watch(&mut lobby, "t1");

        let res = resolve(&lobby);
        let ids: Vec<&str> = res.report.visitors.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["ik", "gm", "sh", "pr"]);
        assert!(res.report.visitors.iter().all(|v| v.label == "visitor"));

        let peeper = res.round.peeper.unwrap();
        assert_eq!(peeper.visitors.len(), 4);
        assert_eq!(
            peeper.watch_result.as_deref(),
            Some("4 player(s) visited your target.")
        );
    }

    #[test]
    fn test_blocked_visitor_is_not_seen() {
        let mut lobby = lobby();
        host(&mut lobby, "t1");
        block(&mut lobby, "ik");
        watch(&mut lobby, "t1");
        let res = resolve(&lobby);
        assert!(res.report.visitors.is_empty());
        assert_eq!(
            res.report.watch_result.as_deref(),
            Some("No one visited your target.")
        );
    }

    #[test]
    fn test_dead_peeper_sees_nothing() {
        let mut lobby = lobby();
        host(&mut lobby, "t1");
        watch(&mut lobby, "t1");
        lobby.players[5].kill(Role::Gunslinger);
        let res = resolve(&lobby);
        assert!(res.report.watch_result.is_none());
    }

    #[test]
    fn test_blocked_sheriff_loses_result() {
        let mut lobby = lobby();
        lobby.round.sheriff = Some(SheriffRecord {
            target_id: Some("gm".into()),
            result: Some(InvestigationResult::Suspicious),
        });
        block(&mut lobby, "sh");

        let res = resolve(&lobby);
        assert!(res.report.sheriff_result_cleared);
        let sheriff = res.round.sheriff.unwrap();
        assert_eq!(sheriff.result, None);
        assert_eq!(sheriff.target_id, None);

        let legacy = GameConfig {
            sheriff_feedback: SheriffFeedback::Legacy,
            ..GameConfig::default()
        };
        let res = resolve_night(&lobby, &legacy);
        assert!(!res.report.sheriff_result_cleared);
        assert_eq!(
            res.round.sheriff.unwrap().result,
            Some(InvestigationResult::Suspicious)
        );
    }

    #[test]
    fn test_unblocked_sheriff_keeps_result() {
        let mut lobby = lobby();
        lobby.round.sheriff = Some(SheriffRecord {
            target_id: Some("gm".into()),
            result: Some(InvestigationResult::Suspicious),
        });
        let sheriff = resolve(&lobby).round.sheriff.unwrap();
        assert_eq!(sheriff.result, Some(InvestigationResult::Suspicious));
        assert_eq!(sheriff.target_id, None);
    }
}
