//! Rule configuration.

use std::collections::BTreeSet;

use nightfall_lobby::Role;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SheriffFeedback
// ---------------------------------------------------------------------------

/// When a blocked Sheriff loses their investigation result.
///
/// Older saved games were resolved by a sequence that reset the block
/// before checking whether the Sheriff was blocked, so the result was never
/// cleared. `Legacy` reproduces that; `Reordered` checks the block first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SheriffFeedback {
    /// A blocked Sheriff's result is cleared at daybreak.
    #[default]
    Reordered,
    /// The result is kept even when the Sheriff was blocked, and the
    /// Sheriff's target is left in place.
    Legacy,
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Rule knobs for a [`GameService`](crate::GameService).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Bullets a Gunslinger starts with.
    pub starting_bullets: u8,

    /// Roles a night kill cannot touch, whoever protects them. Empty by
    /// default; no role in the catalogue is immune unless configured.
    pub immune_roles: BTreeSet<Role>,

    /// How many times a read-compute-write operation is re-run after losing
    /// a revision race before it gives up with an internal error.
    pub conflict_retries: u32,

    pub sheriff_feedback: SheriffFeedback,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_bullets: 2,
            immune_roles: BTreeSet::new(),
            conflict_retries: 3,
            sheriff_feedback: SheriffFeedback::Reordered,
        }
    }
}

impl GameConfig {
    pub fn is_immune(&self, role: Option<Role>) -> bool {
        role.is_some_and(|r| self.immune_roles.contains(&r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_config_default() {
        let config = GameConfig::default();
        assert_eq!(config.starting_bullets, 2);
        assert!(config.immune_roles.is_empty());
        assert_eq!(config.conflict_retries, 3);
        assert_eq!(config.sheriff_feedback, SheriffFeedback::Reordered);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{ "immune_roles": ["Witch"] }"#).unwrap();
        assert!(config.is_immune(Some(Role::Witch)));
        assert!(!config.is_immune(Some(Role::Gunman)));
        assert!(!config.is_immune(None));
        assert_eq!(config.starting_bullets, 2);
    }
}
