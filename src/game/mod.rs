//! Chess rules: value types, pseudo-legal move generation, and the legality
//! checks layered on top of them.

pub mod board;
pub mod moves;
pub mod piece;
pub mod position;
pub mod state;
pub mod utils;

pub use board::Board;
pub use moves::Move;
pub use piece::{Color, Piece, PieceType};
pub use position::Position;
pub use state::GameState;
