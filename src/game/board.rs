use serde::{Deserialize, Serialize};

use super::piece::{Color, Piece, PieceType};
use super::position::Position;

const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

/// 8x8 piece storage. Knows nothing about the rules; callers are trusted to
/// pass on-board positions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
}

impl Board {
    /// An empty board.
    pub fn new() -> Self {
        Board { squares: [[None; 8]; 8] }
    }

    pub fn get(&self, position: Position) -> Option<Piece> {
        let (row, col) = position.index();
        self.squares[row][col]
    }

    pub fn set(&mut self, position: Position, piece: Option<Piece>) {
        let (row, col) = position.index();
        self.squares[row][col] = piece;
    }

    /// Clears the board and lays out both armies in the starting position.
    pub fn reset(&mut self) {
        self.squares = [[None; 8]; 8];
        for (color, back_row, pawn_row) in [(Color::White, 0, 1), (Color::Black, 7, 6)] {
            for (col, piece_type) in BACK_RANK.iter().enumerate() {
                self.squares[back_row][col] = Some(Piece::new(color, *piece_type));
                self.squares[pawn_row][col] = Some(Piece::new(color, PieceType::Pawn));
            }
        }
    }

    /// Every occupied square with its piece, row 1 first.
    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        Position::all().filter_map(move |position| self.get(position).map(|piece| (position, piece)))
    }

    pub fn find_king(&self, color: Color) -> Option<Position> {
        self.pieces()
            .find(|(_, piece)| *piece == Piece::new(color, PieceType::King))
            .map(|(position, _)| position)
    }

    /// Rows of the board, row 1 first, for snapshots.
    pub fn rows(&self) -> &[[Option<Piece>; 8]; 8] {
        &self.squares
    }
}

impl Default for Board {
    /// The standard starting position.
    fn default() -> Self {
        let mut board = Board::new();
        board.reset();
        board
    }
}
