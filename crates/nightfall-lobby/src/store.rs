//! The lobby store boundary and the in-memory reference store.
//!
//! The engine needs two things from storage: read a lobby with its
//! revision, and apply a partial update that is either unconditional (a
//! staging write touching one role record) or conditional on the revision
//! it read (read-compute-write operations such as resolving a night).
//!
//! ```text
//!   get ──→ Versioned { lobby, revision: 7 }
//!                │
//!                ▼ compute
//!   update(patch, Some(7)) ──→ Ok(8)            nobody wrote in between
//!                           └→ Err(Conflict)    somebody did; re-read
//! ```
//!
//! A staging write may also carry the phase it was validated in. The store
//! refuses it with [`StoreError::PhaseMoved`] once the phase has flipped,
//! so a night intent never lands after its night was resolved.

use std::collections::HashMap;
use std::future::Future;

use chrono::{DateTime, Utc};
use nightfall_protocol::{LobbyCode, Phase};
use tokio::sync::RwLock;

use crate::{Lobby, LobbyStatus, Player, RoundPatch, StoreError};

// ---------------------------------------------------------------------------
// LobbyPatch
// ---------------------------------------------------------------------------

/// A server-side timestamp the store fills in while applying a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamp {
    StartedAt,
    PhaseStartedAt,
}

/// A partial update. Every `None` field is left as stored.
#[derive(Debug, Clone, Default)]
pub struct LobbyPatch {
    pub players: Option<Vec<Player>>,
    pub status: Option<LobbyStatus>,
    pub phase: Option<Phase>,
    pub day_count: Option<u32>,
    pub settings: Option<serde_json::Value>,
    pub round: RoundPatch,
    pub stamps: Vec<Stamp>,
    /// Only apply while the stored phase is still this one.
    pub expect_phase: Option<Phase>,
}

impl LobbyPatch {
    /// A patch that only replaces round-state records.
    pub fn round(round: RoundPatch) -> Self {
        Self {
            round,
            ..Self::default()
        }
    }

    /// Like [`round`](Self::round), but only while the lobby is still in
    /// `phase`.
    pub fn round_in(phase: Phase, round: RoundPatch) -> Self {
        Self {
            round,
            expect_phase: Some(phase),
            ..Self::default()
        }
    }

    /// Applies the patch in place, using `now` for any requested stamps.
    pub fn apply(self, lobby: &mut Lobby, now: DateTime<Utc>) {
        if let Some(players) = self.players {
            lobby.players = players;
        }
        if let Some(status) = self.status {
            lobby.status = status;
        }
        if let Some(phase) = self.phase {
            lobby.phase = phase;
        }
        if let Some(day_count) = self.day_count {
            lobby.day_count = day_count;
        }
        if let Some(settings) = self.settings {
            lobby.settings = settings;
        }
        lobby.round.apply(self.round);
        for stamp in self.stamps {
            match stamp {
                Stamp::StartedAt => lobby.started_at = Some(now),
                Stamp::PhaseStartedAt => lobby.phase_started_at = Some(now),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// LobbyStore
// ---------------------------------------------------------------------------

/// A lobby together with the revision it was read at.
#[derive(Debug, Clone)]
pub struct Versioned {
    pub lobby: Lobby,
    pub revision: u64,
}

/// Durable keyed storage for lobbies.
///
/// Every successful `update` bumps the revision, conditional or not, so a
/// conditional writer notices any write that landed after its read.
pub trait LobbyStore: Send + Sync + 'static {
    /// Reads the lobby stored under `code`.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] if there is none.
    fn get(
        &self,
        code: &LobbyCode,
    ) -> impl Future<Output = Result<Versioned, StoreError>> + Send;

    /// Applies `patch`. With `expected = Some(rev)` the write only happens
    /// if the stored revision is still `rev`. Returns the new revision.
    ///
    /// # Errors
    /// - [`StoreError::NotFound`]: no lobby under `code`
    /// - [`StoreError::Conflict`]: the revision moved on since `rev`
    /// - [`StoreError::PhaseMoved`]: `patch.expect_phase` no longer holds
    fn update(
        &self,
        code: &LobbyCode,
        patch: LobbyPatch,
        expected: Option<u64>,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

// ---------------------------------------------------------------------------
// MemoryLobbyStore
// ---------------------------------------------------------------------------

struct Entry {
    lobby: Lobby,
    revision: u64,
}

#[derive(Default)]
struct Inner {
    lobbies: HashMap<LobbyCode, Entry>,
    /// Last timestamp handed out; stamps never go backwards.
    last_stamp: Option<DateTime<Utc>>,
}

/// An in-process [`LobbyStore`].
///
/// All writes go through one `RwLock`, so each update is applied atomically
/// and revisions are totally ordered per lobby.
#[derive(Default)]
pub struct MemoryLobbyStore {
    inner: RwLock<Inner>,
}

impl MemoryLobbyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a lobby at revision 1. Lobby creation is not an engine
    /// operation; this is how a host application (or a test) provides one.
    ///
    /// # Errors
    /// [`StoreError::AlreadyExists`] if the code is taken.
    pub async fn insert(&self, lobby: Lobby) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.lobbies.contains_key(&lobby.code) {
            return Err(StoreError::AlreadyExists(lobby.code));
        }
        tracing::info!(lobby = %lobby.code, players = lobby.players.len(), "lobby seeded");
        inner
            .lobbies
            .insert(lobby.code.clone(), Entry { lobby, revision: 1 });
        Ok(1)
    }

    /// Number of stored lobbies.
    pub async fn len(&self) -> usize {
        self.inner.read().await.lobbies.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn next_stamp(last: &mut Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = match *last {
        Some(prev) if prev > Utc::now() => prev,
        _ => Utc::now(),
    };
    *last = Some(now);
    now
}

impl LobbyStore for MemoryLobbyStore {
    async fn get(&self, code: &LobbyCode) -> Result<Versioned, StoreError> {
        let inner = self.inner.read().await;
        let entry = inner
            .lobbies
            .get(code)
            .ok_or_else(|| StoreError::NotFound(code.clone()))?;
        Ok(Versioned {
            lobby: entry.lobby.clone(),
            revision: entry.revision,
        })
    }

    async fn update(
        &self,
        code: &LobbyCode,
        patch: LobbyPatch,
        expected: Option<u64>,
    ) -> Result<u64, StoreError> {
        let mut guard = self.inner.write().await;
        let Inner {
            lobbies,
            last_stamp,
        } = &mut *guard;

        let entry = lobbies
            .get_mut(code)
            .ok_or_else(|| StoreError::NotFound(code.clone()))?;

        if let Some(expected) = expected {
            if entry.revision != expected {
                return Err(StoreError::Conflict {
                    code: code.clone(),
                    expected,
                    actual: entry.revision,
                });
            }
        }

        if let Some(expected) = patch.expect_phase {
            if entry.lobby.phase != expected {
                return Err(StoreError::PhaseMoved {
                    code: code.clone(),
                    expected,
                    actual: entry.lobby.phase,
                });
            }
        }

        let now = next_stamp(last_stamp);
        patch.apply(&mut entry.lobby, now);
        entry.revision += 1;

        tracing::trace!(lobby = %code, revision = entry.revision, "lobby updated");
        Ok(entry.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InnkeeperRecord, ProstituteRecord};

    #[test]
    fn test_patch_apply_sets_stamps_and_fields() {
        let mut lobby = Lobby::new("wolf", "h");
        let now = Utc::now();
        LobbyPatch {
            phase: Some(Phase::Day),
            stamps: vec![Stamp::PhaseStartedAt],
            ..LobbyPatch::default()
        }
        .apply(&mut lobby, now);

        assert_eq!(lobby.phase, Phase::Day);
        assert_eq!(lobby.phase_started_at, Some(now));
        assert!(lobby.started_at.is_none());
        assert_eq!(lobby.day_count, 1);
    }

    #[test]
    fn test_next_stamp_never_goes_backwards() {
        let future = Utc::now() + chrono::Duration::hours(1);
        let mut last = Some(future);
        assert_eq!(next_stamp(&mut last), future);
        assert_eq!(last, Some(future));
    }

    #[tokio::test]
    async fn test_disjoint_round_writes_both_survive() {
        let store = MemoryLobbyStore::new();
        store.insert(Lobby::new("wolf", "h")).await.unwrap();
        let code = LobbyCode::new("wolf");

        store
            .update(
                &code,
                LobbyPatch::round(RoundPatch {
                    innkeeper: Some(InnkeeperRecord {
                        protected_id: Some("a".into()),
                    }),
                    ..RoundPatch::default()
                }),
                None,
            )
            .await
            .unwrap();
        store
            .update(
                &code,
                LobbyPatch::round(RoundPatch {
                    prostitute: Some(ProstituteRecord {
                        blocked_id: Some("b".into()),
                    }),
                    ..RoundPatch::default()
                }),
                None,
            )
            .await
            .unwrap();

        let Versioned { lobby, revision } = store.get(&code).await.unwrap();
        assert_eq!(revision, 3);
        assert!(lobby.round.innkeeper.is_some());
        assert!(lobby.round.prostitute.is_some());
    }

    #[tokio::test]
    async fn test_stale_conditional_write_conflicts() {
        let store = MemoryLobbyStore::new();
        store.insert(Lobby::new("wolf", "h")).await.unwrap();
        let code = LobbyCode::new("wolf");

        let read = store.get(&code).await.unwrap();
        store
            .update(&code, LobbyPatch::default(), None)
            .await
            .unwrap();

        let result = store
            .update(
                &code,
                LobbyPatch {
                    phase: Some(Phase::Day),
                    ..LobbyPatch::default()
                },
                Some(read.revision),
            )
            .await;
        assert!(matches!(
            result,
            Err(StoreError::Conflict {
                expected: 1,
                actual: 2,
                ..
            })
        ));
        assert_eq!(store.get(&code).await.unwrap().lobby.phase, Phase::Night);
    }

    #[tokio::test]
    async fn test_staging_write_after_phase_flip_is_refused() {
        let store = MemoryLobbyStore::new();
        store.insert(Lobby::new("wolf", "h")).await.unwrap();
        let code = LobbyCode::new("wolf");

        store
            .update(
                &code,
                LobbyPatch {
                    phase: Some(Phase::Day),
                    ..LobbyPatch::default()
                },
                None,
            )
            .await
            .unwrap();

        let result = store
            .update(
                &code,
                LobbyPatch::round_in(
                    Phase::Night,
                    RoundPatch {
                        innkeeper: Some(InnkeeperRecord {
                            protected_id: Some("a".into()),
                        }),
                        ..RoundPatch::default()
                    },
                ),
                None,
            )
            .await;
        assert!(matches!(
            result,
            Err(StoreError::PhaseMoved {
                expected: Phase::Night,
                actual: Phase::Day,
                ..
            })
        ));
        let Versioned { lobby, revision } = store.get(&code).await.unwrap();
        assert_eq!(revision, 2);
        assert!(lobby.round.innkeeper.is_none());
    }

    #[tokio::test]
    async fn test_missing_lobby_is_not_found() {
        let store = MemoryLobbyStore::new();
        let result = store.get(&LobbyCode::new("nope")).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_insert_twice_is_rejected() {
        let store = MemoryLobbyStore::new();
        store.insert(Lobby::new("wolf", "h")).await.unwrap();
        let result = store.insert(Lobby::new("WOLF", "h2")).await;
        assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
        assert_eq!(store.len().await, 1);
    }
}
