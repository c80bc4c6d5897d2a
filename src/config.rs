use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, StoreError};
use crate::store::{MatchStore, MemoryIdentityStore, MemoryMatchStore};

pub const CONFIG_ENV_VAR: &str = "CHESS_SERVER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "chess_server.toml";

/// Server configuration, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Served under `/static` when the directory exists.
    pub static_dir: PathBuf,
    /// Tokens accepted at startup.
    pub identities: Vec<IdentitySeed>,
    /// Matches created at startup, ids assigned in order from 1.
    pub matches: Vec<MatchSeed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentitySeed {
    pub username: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSeed {
    pub name: String,
    #[serde(default)]
    pub white: Option<String>,
    #[serde(default)]
    pub black: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address: "127.0.0.1:8080".to_string(),
            static_dir: PathBuf::from("./static"),
            identities: Vec::new(),
            matches: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// The config path: first CLI argument, then `CHESS_SERVER_CONFIG`, then
    /// `chess_server.toml`.
    pub fn path_from_env() -> PathBuf {
        std::env::args()
            .nth(1)
            .or_else(|| std::env::var(CONFIG_ENV_VAR).ok())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Falls back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!("Config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Validation("bind_address must not be empty".into()));
        }
        let mut tokens = HashSet::new();
        for identity in &self.identities {
            if identity.username.trim().is_empty() || identity.token.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "identities need a non-empty username and token".into(),
                ));
            }
            if !tokens.insert(identity.token.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "token for '{}' is used more than once",
                    identity.username
                )));
            }
        }
        for seed in &self.matches {
            if seed.name.trim().is_empty() {
                return Err(ConfigError::Validation("matches need a name".into()));
            }
            if seed.white.is_some() && seed.white == seed.black {
                return Err(ConfigError::Validation(format!(
                    "match '{}' seats the same player on both sides",
                    seed.name
                )));
            }
        }
        Ok(())
    }

    /// Loads the configured identities and matches into the in-memory stores.
    pub fn seed(&self, identities: &MemoryIdentityStore, matches: &MemoryMatchStore) -> Result<(), StoreError> {
        for identity in &self.identities {
            identities.insert(&identity.token, &identity.username)?;
        }
        for seed in &self.matches {
            let game_id = matches.create(&seed.name)?;
            if seed.white.is_some() || seed.black.is_some() {
                if let Some(mut session) = matches.get(game_id)? {
                    session.white_player = seed.white.clone();
                    session.black_player = seed.black.clone();
                    matches.save(&session)?;
                }
            }
        }
        info!(
            "Seeded {} identities and {} matches",
            self.identities.len(),
            self.matches.len()
        );
        Ok(())
    }
}
