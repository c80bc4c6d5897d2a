use super::piece::Color;
use super::state::GameState;

/// Convert a color to the lowercase form used in notifications.
pub fn color_to_string(color: Color) -> String {
    match color {
        Color::White => "white".to_string(),
        Color::Black => "black".to_string(),
    }
}

/// Get the game status as a string, from the point of view of the side to move.
pub fn get_game_status(game: &GameState) -> String {
    let to_move = game.turn();
    if game.is_in_checkmate(to_move) {
        format!("{}_wins", color_to_string(to_move.opponent()))
    } else if game.is_in_stalemate(to_move) {
        "stalemate".to_string()
    } else if game.is_over() {
        "over".to_string()
    } else if game.is_in_check(to_move) {
        "check".to_string()
    } else {
        format!("{}_turn", color_to_string(to_move))
    }
}
