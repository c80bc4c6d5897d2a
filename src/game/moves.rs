use serde::{Deserialize, Serialize};
use std::fmt;

use super::piece::PieceType;
use super::position::Position;

/// A move from one square to another; `promotion` is set only for a pawn
/// reaching the far rank.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub start: Position,
    pub end: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceType>,
}

impl Move {
    pub fn new(start: Position, end: Position) -> Self {
        Move { start, end, promotion: None }
    }

    pub fn with_promotion(start: Position, end: Position, promotion: PieceType) -> Self {
        Move { start, end, promotion: Some(promotion) }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)?;
        if let Some(promotion) = self.promotion {
            write!(f, " ({})", promotion)?;
        }
        Ok(())
    }
}
