//! Server configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use nightfall_engine::GameConfig;
use nightfall_lobby::Lobby;

use crate::NightfallError;

/// Address to bind to.
pub const BIND_VAR: &str = "NIGHTFALL_BIND";
/// JSON array of lobbies to preload.
pub const LOBBIES_VAR: &str = "NIGHTFALL_LOBBIES";
/// JSON object of rule overrides.
pub const RULES_VAR: &str = "NIGHTFALL_RULES";
/// Seconds a connection may stay silent before it is dropped.
pub const IDLE_TIMEOUT_VAR: &str = "NIGHTFALL_IDLE_TIMEOUT_SECS";

/// How the server listens and what it loads at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Lobbies to seed the store with. Lobby creation happens elsewhere;
    /// this is how they get here.
    pub seed_path: Option<PathBuf>,
    /// Rule overrides; missing fields keep their defaults.
    pub rules_path: Option<PathBuf>,
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            seed_path: None,
            rules_path: None,
            idle_timeout: Duration::from_secs(15),
        }
    }
}

impl ServerConfig {
    /// Reads overrides from the environment.
    ///
    /// # Errors
    /// [`NightfallError::Config`] if the idle timeout is not a number.
    pub fn from_env() -> Result<Self, NightfallError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, NightfallError> {
        let mut config = Self::default();
        if let Some(addr) = lookup(BIND_VAR) {
            config.bind_addr = addr;
        }
        config.seed_path = lookup(LOBBIES_VAR).map(PathBuf::from);
        config.rules_path = lookup(RULES_VAR).map(PathBuf::from);
        if let Some(secs) = lookup(IDLE_TIMEOUT_VAR) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                NightfallError::Config(format!("{IDLE_TIMEOUT_VAR} must be whole seconds, got {secs:?}"))
            })?;
            config.idle_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Loads the seed lobbies, if a seed file is configured.
    ///
    /// # Errors
    /// I/O failures, or [`NightfallError::Config`] if the file is not a
    /// JSON array of lobbies (an unknown role name included).
    pub async fn seed_lobbies(&self) -> Result<Vec<Lobby>, NightfallError> {
        match &self.seed_path {
            Some(path) => read_json(path).await,
            None => Ok(Vec::new()),
        }
    }

    /// Loads the rules, falling back to the defaults.
    ///
    /// # Errors
    /// I/O failures, or [`NightfallError::Config`] on malformed JSON.
    pub async fn game_config(&self) -> Result<GameConfig, NightfallError> {
        match &self.rules_path {
            Some(path) => read_json(path).await,
            None => Ok(GameConfig::default()),
        }
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, NightfallError> {
    let bytes = tokio::fs::read(path).await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| NightfallError::Config(format!("{}: {e}", path.display())))
}
