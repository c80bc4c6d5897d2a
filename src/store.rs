//! The collaborators the coordinator leans on: who a token belongs to, and
//! where match records live. Both have in-memory implementations.

use log::info;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{GameId, MatchSession};

/// Maps an auth token to the identity it was issued for.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, auth_token: &str) -> Result<String, StoreError>;
}

/// Persistence for match records.
pub trait MatchStore: Send + Sync {
    fn get(&self, game_id: GameId) -> Result<Option<MatchSession>, StoreError>;
    fn save(&self, session: &MatchSession) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryIdentityStore {
    tokens: RwLock<HashMap<String, String>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh random token for `username`.
    pub fn issue(&self, username: &str) -> Result<String, StoreError> {
        let token = Uuid::new_v4().to_string();
        self.insert(&token, username)?;
        Ok(token)
    }

    /// Registers a known token, e.g. one read from configuration.
    pub fn insert(&self, token: &str, username: &str) -> Result<(), StoreError> {
        let mut tokens = self.tokens.write().map_err(|_| poisoned("identity"))?;
        tokens.insert(token.to_string(), username.to_string());
        Ok(())
    }
}

impl IdentityResolver for MemoryIdentityStore {
    fn resolve(&self, auth_token: &str) -> Result<String, StoreError> {
        let tokens = self.tokens.read().map_err(|_| poisoned("identity"))?;
        tokens.get(auth_token).cloned().ok_or(StoreError::Unauthorized)
    }
}

/// Match records keyed by id; ids count up from 1.
pub struct MemoryMatchStore {
    games: RwLock<HashMap<GameId, MatchSession>>,
    next_id: AtomicU32,
}

impl Default for MemoryMatchStore {
    fn default() -> Self {
        MemoryMatchStore {
            games: RwLock::new(HashMap::new()),
            next_id: AtomicU32::new(1),
        }
    }
}

impl MemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a match in the starting position and returns its id.
    pub fn create(&self, game_name: &str) -> Result<GameId, StoreError> {
        let game_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.save(&MatchSession::new(game_id, game_name))?;
        info!("Created game {} ({})", game_id, game_name);
        Ok(game_id)
    }
}

impl MatchStore for MemoryMatchStore {
    fn get(&self, game_id: GameId) -> Result<Option<MatchSession>, StoreError> {
        let games = self.games.read().map_err(|_| poisoned("match"))?;
        Ok(games.get(&game_id).cloned())
    }

    fn save(&self, session: &MatchSession) -> Result<(), StoreError> {
        let mut games = self.games.write().map_err(|_| poisoned("match"))?;
        games.insert(session.game_id, session.clone());
        Ok(())
    }
}

fn poisoned(store: &str) -> StoreError {
    StoreError::Storage(format!("{} store lock poisoned", store))
}
