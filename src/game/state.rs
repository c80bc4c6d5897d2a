use serde::{Deserialize, Serialize};

use super::board::Board;
use super::moves::Move;
use super::piece::{Color, Piece};
use super::position::Position;
use crate::error::InvalidMoveError;

/// The authoritative position of one game: the board, whose turn it is, and
/// whether the game has ended.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    board: Board,
    turn: Color,
    game_over: bool,
}

impl GameState {
    /// A fresh game in the starting position, white to move.
    pub fn new() -> Self {
        GameState {
            board: Board::default(),
            turn: Color::White,
            game_over: false,
        }
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn set_turn(&mut self, color: Color) {
        self.turn = color;
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn set_board(&mut self, board: Board) {
        self.board = board;
    }

    pub fn is_over(&self) -> bool {
        self.game_over
    }

    /// Marks the game finished; later moves are refused.
    pub fn end(&mut self) {
        self.game_over = true;
    }

    /// Legal moves for the piece on `position`, or `None` if the square is
    /// empty.
    pub fn valid_moves(&self, position: Position) -> Option<Vec<Move>> {
        if !position.is_on_board() {
            return None;
        }
        let piece = self.board.get(position)?;
        let moves = piece
            .piece_moves(&self.board, position)
            .into_iter()
            .filter(|candidate| !self.leaves_king_attacked(piece, candidate))
            .collect();
        Some(moves)
    }

    /// Applies `mv` if it is legal for the side to move, then passes the turn.
    /// On error nothing changes.
    pub fn make_move(&mut self, mv: Move) -> Result<(), InvalidMoveError> {
        if self.game_over {
            return Err(InvalidMoveError::GameOver);
        }
        if !mv.start.is_on_board() || !mv.end.is_on_board() {
            return Err(InvalidMoveError::Illegal(mv));
        }
        let piece = self.board.get(mv.start).ok_or(InvalidMoveError::NoPiece(mv.start))?;
        if piece.color != self.turn {
            return Err(InvalidMoveError::WrongTurn {
                turn: self.turn,
                piece: piece.color,
            });
        }
        let legal = self.valid_moves(mv.start).unwrap_or_default();
        if !legal.contains(&mv) {
            return Err(InvalidMoveError::Illegal(mv));
        }

        apply(&mut self.board, piece, &mv);
        self.turn = self.turn.opponent();
        Ok(())
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        king_is_attacked(&self.board, color)
    }

    pub fn is_in_checkmate(&self, color: Color) -> bool {
        self.is_in_check(color) && !self.has_any_legal_move(color)
    }

    pub fn is_in_stalemate(&self, color: Color) -> bool {
        !self.is_in_check(color) && !self.has_any_legal_move(color)
    }

    fn has_any_legal_move(&self, color: Color) -> bool {
        self.board
            .pieces()
            .filter(|(_, piece)| piece.color == color)
            .any(|(position, _)| {
                self.valid_moves(position)
                    .map_or(false, |moves| !moves.is_empty())
            })
    }

    /// Simulates `candidate` on a copy of the board and rescans for attacks on
    /// the mover's king.
    fn leaves_king_attacked(&self, piece: Piece, candidate: &Move) -> bool {
        let mut scratch = self.board.clone();
        apply(&mut scratch, piece, candidate);
        king_is_attacked(&scratch, piece.color)
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new()
    }
}

fn apply(board: &mut Board, piece: Piece, mv: &Move) {
    let placed = match mv.promotion {
        Some(promotion) => Piece::new(piece.color, promotion),
        None => piece,
    };
    board.set(mv.start, None);
    board.set(mv.end, Some(placed));
}

/// True if any enemy piece has a pseudo-legal move ending on `color`'s king.
fn king_is_attacked(board: &Board, color: Color) -> bool {
    let Some(king) = board.find_king(color) else {
        return false;
    };
    board
        .pieces()
        .filter(|(_, piece)| piece.color != color)
        .any(|(position, piece)| {
            piece
                .piece_moves(board, position)
                .iter()
                .any(|mv| mv.end == king)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::PieceType;

    fn pos(row: u8, col: u8) -> Position {
        Position::new(row, col)
    }

    fn mv(from: (u8, u8), to: (u8, u8)) -> Move {
        Move::new(pos(from.0, from.1), pos(to.0, to.1))
    }

    fn place(board: &mut Board, row: u8, col: u8, color: Color, piece_type: PieceType) {
        board.set(pos(row, col), Some(Piece::new(color, piece_type)));
    }

    #[test]
    fn empty_square_has_no_valid_moves() {
        let game = GameState::new();
        assert_eq!(game.valid_moves(pos(4, 4)), None);
        assert_eq!(game.valid_moves(pos(0, 4)), None);
    }

    #[test]
    fn starting_position_has_twenty_moves_for_white() {
        let game = GameState::new();
        let total: usize = game
            .board()
            .pieces()
            .filter(|(_, piece)| piece.color == Color::White)
            .map(|(position, _)| game.valid_moves(position).map_or(0, |m| m.len()))
            .sum();
        assert_eq!(total, 20);
    }

    #[test]
    fn pinned_piece_cannot_expose_its_king() {
        let mut board = Board::new();
        place(&mut board, 1, 5, Color::White, PieceType::King);
        place(&mut board, 2, 5, Color::White, PieceType::Rook);
        place(&mut board, 8, 5, Color::Black, PieceType::Queen);
        place(&mut board, 8, 1, Color::Black, PieceType::King);
        let mut game = GameState::new();
        game.set_board(board);

        let moves = game.valid_moves(pos(2, 5)).unwrap();
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|m| m.end.col() == 5));

        for (position, piece) in game.board().pieces() {
            for candidate in game.valid_moves(position).unwrap() {
                let mut copy = game.clone();
                copy.set_turn(piece.color);
                copy.make_move(candidate).unwrap();
                assert!(!copy.is_in_check(piece.color));
            }
        }
    }

    #[test]
    fn successful_move_flips_turn_once() {
        let mut game = GameState::new();
        game.make_move(mv((2, 5), (4, 5))).unwrap();
        assert_eq!(game.turn(), Color::Black);
        assert_eq!(game.board().get(pos(4, 5)), Some(Piece::new(Color::White, PieceType::Pawn)));
        assert_eq!(game.board().get(pos(2, 5)), None);
    }

    #[test]
    fn rejected_moves_leave_the_game_untouched() {
        let mut game = GameState::new();
        let before = game.clone();

        assert_eq!(game.make_move(mv((4, 4), (5, 4))), Err(InvalidMoveError::NoPiece(pos(4, 4))));
        assert_eq!(
            game.make_move(mv((7, 5), (5, 5))),
            Err(InvalidMoveError::WrongTurn { turn: Color::White, piece: Color::Black })
        );
        assert_eq!(game.make_move(mv((2, 5), (5, 5))), Err(InvalidMoveError::Illegal(mv((2, 5), (5, 5)))));
        assert!(matches!(game.make_move(mv((0, 5), (5, 5))), Err(InvalidMoveError::Illegal(_))));

        assert_eq!(game, before);
    }

    #[test]
    fn starting_position_is_neither_mate_nor_stalemate() {
        let game = GameState::new();
        for color in [Color::White, Color::Black] {
            assert!(!game.is_in_check(color));
            assert!(!game.is_in_checkmate(color));
            assert!(!game.is_in_stalemate(color));
        }
    }

    #[test]
    fn fools_mate_is_checkmate() {
        let mut game = GameState::new();
        game.make_move(mv((2, 6), (3, 6))).unwrap();
        game.make_move(mv((7, 5), (5, 5))).unwrap();
        game.make_move(mv((2, 7), (4, 7))).unwrap();
        game.make_move(mv((8, 4), (4, 8))).unwrap();

        assert!(game.is_in_check(Color::White));
        assert!(game.is_in_checkmate(Color::White));
        assert!(!game.is_in_stalemate(Color::White));
        assert!(!game.is_in_checkmate(Color::Black));
    }

    #[test]
    fn cornered_king_with_no_moves_is_stalemate() {
        let mut board = Board::new();
        place(&mut board, 8, 8, Color::Black, PieceType::King);
        place(&mut board, 6, 7, Color::White, PieceType::Queen);
        place(&mut board, 1, 1, Color::White, PieceType::King);
        let mut game = GameState::new();
        game.set_board(board);
        game.set_turn(Color::Black);

        assert!(!game.is_in_check(Color::Black));
        assert!(game.is_in_stalemate(Color::Black));
        assert!(!game.is_in_checkmate(Color::Black));
    }

    #[test]
    fn promotion_places_the_chosen_piece() {
        let mut board = Board::new();
        place(&mut board, 7, 1, Color::White, PieceType::Pawn);
        place(&mut board, 1, 5, Color::White, PieceType::King);
        place(&mut board, 8, 8, Color::Black, PieceType::King);
        let mut game = GameState::new();
        game.set_board(board);

        assert!(matches!(game.make_move(mv((7, 1), (8, 1))), Err(InvalidMoveError::Illegal(_))));
        game.make_move(Move::with_promotion(pos(7, 1), pos(8, 1), PieceType::Knight))
            .unwrap();

        assert_eq!(game.board().get(pos(8, 1)), Some(Piece::new(Color::White, PieceType::Knight)));
        assert_eq!(game.turn(), Color::Black);
    }

    #[test]
    fn finished_game_refuses_moves() {
        let mut game = GameState::new();
        game.end();
        assert_eq!(game.make_move(mv((2, 5), (4, 5))), Err(InvalidMoveError::GameOver));
        assert_eq!(game.turn(), Color::White);
    }

    #[test]
    fn king_cannot_step_into_check() {
        let mut board = Board::new();
        place(&mut board, 1, 5, Color::White, PieceType::King);
        place(&mut board, 8, 4, Color::Black, PieceType::Rook);
        place(&mut board, 8, 8, Color::Black, PieceType::King);
        let game = GameState { board, turn: Color::White, game_over: false };

        let moves = game.valid_moves(pos(1, 5)).unwrap();
        assert!(moves.iter().all(|m| m.end.col() != 4));
        assert_eq!(moves.len(), 3);
    }
}
