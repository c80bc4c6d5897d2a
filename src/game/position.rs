use serde::{Deserialize, Serialize};
use std::fmt;

/// A square on the board. Rows and columns are 1-8; row 1 is white's back rank,
/// column 1 is the a-file.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    row: u8,
    col: u8,
}

impl Position {
    pub const fn new(row: u8, col: u8) -> Self {
        Position { row, col }
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    pub fn col(&self) -> u8 {
        self.col
    }

    /// Positions decoded from a client can be anything; only 1..=8 is a square.
    pub fn is_on_board(&self) -> bool {
        (1..=8).contains(&self.row) && (1..=8).contains(&self.col)
    }

    /// The square `(dr, dc)` away, or `None` past the edge.
    pub fn offset(&self, dr: i8, dc: i8) -> Option<Position> {
        let row = self.row as i8 + dr;
        let col = self.col as i8 + dc;
        if (1..=8).contains(&row) && (1..=8).contains(&col) {
            Some(Position::new(row as u8, col as u8))
        } else {
            None
        }
    }

    /// Iterates all 64 squares, row 1 first.
    pub fn all() -> impl Iterator<Item = Position> {
        (1..=8).flat_map(|row| (1..=8).map(move |col| Position::new(row, col)))
    }

    pub(crate) fn index(&self) -> (usize, usize) {
        (self.row as usize - 1, self.col as usize - 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_on_board() {
            write!(f, "{}{}", (b'a' + self.col - 1) as char, self.row)
        } else {
            write!(f, "({},{})", self.row, self.col)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_algebraic_squares() {
        assert_eq!(Position::new(2, 5).to_string(), "e2");
        assert_eq!(Position::new(8, 1).to_string(), "a8");
        assert_eq!(Position::new(0, 9).to_string(), "(0,9)");
    }

    #[test]
    fn offset_stops_at_the_edge() {
        let corner = Position::new(1, 8);
        assert_eq!(corner.offset(1, -1), Some(Position::new(2, 7)));
        assert_eq!(corner.offset(0, 1), None);
        assert_eq!(corner.offset(-1, 0), None);
    }

    #[test]
    fn all_covers_every_square_once() {
        let squares: Vec<_> = Position::all().collect();
        assert_eq!(squares.len(), 64);
        assert_eq!(squares[0], Position::new(1, 1));
        assert_eq!(squares[63], Position::new(8, 8));
    }
}
