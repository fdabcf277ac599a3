//! Error types for the lobby store.

use nightfall_protocol::{LobbyCode, Phase};

/// Errors a [`LobbyStore`](crate::LobbyStore) can report.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No lobby is stored under this code.
    #[error("lobby {0} not found")]
    NotFound(LobbyCode),

    /// A conditional update lost the race: the record changed after it
    /// was read.
    #[error("lobby {code} changed concurrently (expected revision {expected}, found {actual})")]
    Conflict {
        code: LobbyCode,
        expected: u64,
        actual: u64,
    },

    /// A phase-guarded update arrived after the phase changed.
    #[error("lobby {code} left phase {expected} (now {actual})")]
    PhaseMoved {
        code: LobbyCode,
        expected: Phase,
        actual: Phase,
    },

    /// `insert` was called for a code that is already taken.
    #[error("lobby {0} already exists")]
    AlreadyExists(LobbyCode),

    /// The backing storage failed.
    #[error("storage backend failure: {0}")]
    Backend(String),
}
