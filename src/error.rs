//! Error types for the match server.

use std::path::PathBuf;

use thiserror::Error;

use crate::game::{Color, Move, Position};
use crate::models::GameId;

/// Why the rules engine refused a move.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidMoveError {
    #[error("the game is already over")]
    GameOver,

    #[error("no piece at {0}")]
    NoPiece(Position),

    #[error("it is {turn}'s turn, not {piece}'s")]
    WrongTurn { turn: Color, piece: Color },

    #[error("{0} is not a legal move")]
    Illegal(Move),
}

/// Failures reported by the identity resolver or the match store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("storage failure: {0}")]
    Storage(String),
}

/// Every way a single inbound command can be rejected. Each one is reported to
/// the originating connection only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("game {0} not found")]
    NotFound(GameId),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid move: {0}")]
    InvalidMove(#[from] InvalidMoveError),

    #[error("the game is already over")]
    AlreadyOver,

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unauthorized => CommandError::Unauthorized,
            StoreError::Storage(reason) => CommandError::Storage(reason),
        }
    }
}

/// A connection could not take a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,
}

/// Errors while loading the server configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Validation(String),
}
