//! Game start: deal the configured role pool onto the seated players.

use nightfall_lobby::{Lobby, LobbyPatch, LobbyStatus, Player, Role, Stamp};
use nightfall_protocol::{Phase, PlayerId};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::GameError;

/// Builds the role pool and shuffles it onto the players.
///
/// Players keep their seat order; only the roles move. Everyone starts
/// alive with no killer recorded.
///
/// # Errors
/// [`GameError::RoleCountMismatch`] if the pool is not exactly as large as
/// the table, or if a role with an ability is configured more than once.
pub fn deal_roles<R: Rng + ?Sized>(lobby: &Lobby, rng: &mut R) -> Result<Vec<Player>, GameError> {
    if lobby.role_pool_size() != lobby.players.len() {
        return Err(GameError::RoleCountMismatch(
            "Player count doesn't match total roles".into(),
        ));
    }
    // Night resolution looks up one holder per acting role.
    if let Some((role, _)) = lobby
        .role_counts
        .iter()
        .find(|(role, count)| role.capability().is_some() && **count > 1)
    {
        return Err(GameError::RoleCountMismatch(format!(
            "At most one {role} may be in play"
        )));
    }

    let mut pool: Vec<Role> = lobby
        .role_counts
        .iter()
        .flat_map(|(&role, &count)| std::iter::repeat_n(role, count as usize))
        .collect();
    pool.shuffle(rng);

    Ok(lobby
        .players
        .iter()
        .zip(pool)
        .map(|(player, role)| Player {
            role: Some(role),
            is_alive: true,
            killed_by: None,
            ..player.clone()
        })
        .collect())
}

/// Validates a start request and builds the write that starts the game.
///
/// # Errors
/// `Forbidden` unless `host` is the lobby's host, `InvalidPhase` if the
/// game already started, and whatever [`deal_roles`] returns.
pub fn plan_start<R: Rng + ?Sized>(
    lobby: &Lobby,
    host: &PlayerId,
    rng: &mut R,
) -> Result<LobbyPatch, GameError> {
    if !lobby.is_host(host) {
        return Err(GameError::Forbidden(
            "Only the host can start the game".into(),
        ));
    }
    if lobby.status == LobbyStatus::Started {
        return Err(GameError::InvalidPhase("Game has already started".into()));
    }

    let players = deal_roles(lobby, rng)?;
    Ok(LobbyPatch {
        players: Some(players),
        status: Some(LobbyStatus::Started),
        phase: Some(Phase::Night),
        day_count: Some(1),
        stamps: vec![Stamp::StartedAt, Stamp::PhaseStartedAt],
        ..LobbyPatch::default()
    })
}
