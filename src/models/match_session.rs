use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::CommandError;
use crate::game::{Color, GameState};

pub type GameId = u32;

/// Where a match currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    /// At least one color slot is empty.
    Waiting,
    InProgress,
    /// Ended by resignation, checkmate or stalemate.
    Over,
}

/// The role an identity takes when it connects to a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    Player(Color),
    Observer,
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seat::Player(color) => write!(f, "{}", color),
            Seat::Observer => write!(f, "OBSERVER"),
        }
    }
}

/// Record of one game: its position, who holds each color, who is watching.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MatchSession {
    pub game_id: GameId,
    pub game_name: String,
    pub game: GameState,
    pub white_player: Option<String>,
    pub black_player: Option<String>,
    #[serde(default)]
    pub observers: BTreeSet<String>,
}

impl MatchSession {
    pub fn new(game_id: GameId, game_name: impl Into<String>) -> Self {
        MatchSession {
            game_id,
            game_name: game_name.into(),
            game: GameState::new(),
            white_player: None,
            black_player: None,
            observers: BTreeSet::new(),
        }
    }

    pub fn status(&self) -> MatchStatus {
        if self.game.is_over() {
            MatchStatus::Over
        } else if self.white_player.is_none() || self.black_player.is_none() {
            MatchStatus::Waiting
        } else {
            MatchStatus::InProgress
        }
    }

    pub fn player(&self, color: Color) -> Option<&str> {
        match color {
            Color::White => self.white_player.as_deref(),
            Color::Black => self.black_player.as_deref(),
        }
    }

    fn slot_mut(&mut self, color: Color) -> &mut Option<String> {
        match color {
            Color::White => &mut self.white_player,
            Color::Black => &mut self.black_player,
        }
    }

    /// The color `identity` plays, if it holds a seat.
    pub fn color_of(&self, identity: &str) -> Option<Color> {
        [Color::White, Color::Black]
            .into_iter()
            .find(|&color| self.player(color) == Some(identity))
    }

    /// Seats `identity` or makes it an observer. A seated identity keeps its
    /// color; a requested color is granted only if nobody else holds it; with
    /// no request the first free slot is taken while the game is still live.
    /// Returns the seat and whether the record changed.
    pub fn join(&mut self, identity: &str, preference: Option<Color>) -> Result<(Seat, bool), CommandError> {
        if let Some(color) = self.color_of(identity) {
            return match preference {
                Some(requested) if requested != color => Err(CommandError::Forbidden(format!(
                    "{} is already playing {}",
                    identity, color
                ))),
                _ => Ok((Seat::Player(color), false)),
            };
        }

        let over = self.game.is_over();
        let seat = match preference {
            Some(color) => match self.player(color) {
                Some(holder) => {
                    return Err(CommandError::Forbidden(format!("{} is already taken by {}", color, holder)));
                }
                None if over => return Err(CommandError::AlreadyOver),
                None => Some(color),
            },
            None if over => None,
            None => [Color::White, Color::Black]
                .into_iter()
                .find(|&color| self.player(color).is_none()),
        };

        match seat {
            Some(color) => {
                *self.slot_mut(color) = Some(identity.to_string());
                self.observers.remove(identity);
                Ok((Seat::Player(color), true))
            }
            None => {
                let added = self.observers.insert(identity.to_string());
                Ok((Seat::Observer, added))
            }
        }
    }

    /// Frees whatever seat `identity` holds. Returns the seat it vacated.
    pub fn leave(&mut self, identity: &str) -> Option<Seat> {
        if let Some(color) = self.color_of(identity) {
            *self.slot_mut(color) = None;
            Some(Seat::Player(color))
        } else if self.observers.remove(identity) {
            Some(Seat::Observer)
        } else {
            None
        }
    }
}
