use serde::{Deserialize, Serialize};
use std::fmt;

use super::board::Board;
use super::moves::Move;
use super::position::Position;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Direction pawns of this color advance in.
    fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    fn pawn_home_row(self) -> u8 {
        match self {
            Color::White => 2,
            Color::Black => 7,
        }
    }

    fn promotion_row(self) -> u8 {
        match self {
            Color::White => 8,
            Color::Black => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "WHITE"),
            Color::Black => write!(f, "BLACK"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum PieceType {
    King,
    Queen,
    Bishop,
    Knight,
    Rook,
    Pawn,
}

impl PieceType {
    /// What a pawn may turn into, in the order moves are generated.
    pub const PROMOTIONS: [PieceType; 4] = [
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
    ];

    fn movement(self) -> Movement {
        match self {
            PieceType::Rook => Movement::Slide(&AXES),
            PieceType::Bishop => Movement::Slide(&DIAGONALS),
            PieceType::Queen => Movement::Slide(&ALL_DIRECTIONS),
            PieceType::King => Movement::Step(&ALL_DIRECTIONS),
            PieceType::Knight => Movement::Step(&KNIGHT_JUMPS),
            PieceType::Pawn => Movement::Pawn,
        }
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceType::King => "KING",
            PieceType::Queen => "QUEEN",
            PieceType::Bishop => "BISHOP",
            PieceType::Knight => "KNIGHT",
            PieceType::Rook => "ROOK",
            PieceType::Pawn => "PAWN",
        };
        write!(f, "{}", name)
    }
}

const AXES: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ALL_DIRECTIONS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];
const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

/// How a piece type moves. Every type maps to exactly one of these.
enum Movement {
    /// Repeat each direction until the edge or the first occupied square.
    Slide(&'static [(i8, i8)]),
    /// One jump per offset.
    Step(&'static [(i8, i8)]),
    Pawn,
}

/// A chess piece; two pieces are equal when color and type match.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    #[serde(rename = "type")]
    pub piece_type: PieceType,
}

impl Piece {
    pub const fn new(color: Color, piece_type: PieceType) -> Self {
        Piece { color, piece_type }
    }

    /// Pseudo-legal moves for this piece standing on `from`. Does not consider
    /// whether the move leaves the mover's own king attacked.
    pub fn piece_moves(&self, board: &Board, from: Position) -> Vec<Move> {
        let mut moves = Vec::new();
        match self.piece_type.movement() {
            Movement::Slide(directions) => self.slide(board, from, directions, &mut moves),
            Movement::Step(offsets) => self.step(board, from, offsets, &mut moves),
            Movement::Pawn => self.pawn(board, from, &mut moves),
        }
        moves
    }

    fn is_enemy_of(&self, other: &Piece) -> bool {
        self.color != other.color
    }

    fn slide(&self, board: &Board, from: Position, directions: &[(i8, i8)], moves: &mut Vec<Move>) {
        for &(dr, dc) in directions {
            let mut current = from;
            while let Some(next) = current.offset(dr, dc) {
                match board.get(next) {
                    None => moves.push(Move::new(from, next)),
                    Some(target) => {
                        if self.is_enemy_of(&target) {
                            moves.push(Move::new(from, next));
                        }
                        break;
                    }
                }
                current = next;
            }
        }
    }

    fn step(&self, board: &Board, from: Position, offsets: &[(i8, i8)], moves: &mut Vec<Move>) {
        for &(dr, dc) in offsets {
            if let Some(to) = from.offset(dr, dc) {
                match board.get(to) {
                    Some(target) if !self.is_enemy_of(&target) => {}
                    _ => moves.push(Move::new(from, to)),
                }
            }
        }
    }

    fn pawn(&self, board: &Board, from: Position, moves: &mut Vec<Move>) {
        let forward = self.color.forward();

        if let Some(one) = from.offset(forward, 0) {
            if board.get(one).is_none() {
                self.push_pawn_move(from, one, moves);

                if from.row() == self.color.pawn_home_row() {
                    if let Some(two) = one.offset(forward, 0) {
                        if board.get(two).is_none() {
                            self.push_pawn_move(from, two, moves);
                        }
                    }
                }
            }
        }

        for dc in [-1, 1] {
            if let Some(to) = from.offset(forward, dc) {
                if let Some(target) = board.get(to) {
                    if self.is_enemy_of(&target) {
                        self.push_pawn_move(from, to, moves);
                    }
                }
            }
        }
    }

    fn push_pawn_move(&self, from: Position, to: Position, moves: &mut Vec<Move>) {
        if to.row() == self.color.promotion_row() {
            moves.extend(
                PieceType::PROMOTIONS
                    .iter()
                    .map(|&promotion| Move::with_promotion(from, to, promotion)),
            );
        } else {
            moves.push(Move::new(from, to));
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color, self.piece_type)
    }
}
