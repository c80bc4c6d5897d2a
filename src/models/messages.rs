use actix::Message;
use serde::{Deserialize, Serialize};

use crate::error::CommandError;
use crate::game::utils::get_game_status;
use crate::game::{Color, Move, Piece};
use crate::models::{GameId, MatchSession};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandType {
    Connect,
    MakeMove,
    Leave,
    Resign,
}

/// Command sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserGameCommand {
    pub command_type: CommandType,
    pub auth_token: String,
    #[serde(rename = "gameID")]
    pub game_id: GameId,
    #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
    pub chess_move: Option<Move>,
    /// Only read by CONNECT.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_color: Option<Color>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessageType {
    LoadGame,
    Notification,
    Error,
}

/// Message sent from server to client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    pub server_message_type: ServerMessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<GameSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ServerMessage {
    pub fn load_game(session: &MatchSession) -> Self {
        ServerMessage {
            server_message_type: ServerMessageType::LoadGame,
            game: Some(GameSnapshot::from(session)),
            message: None,
            error_message: None,
        }
    }

    pub fn notification(text: impl Into<String>) -> Self {
        ServerMessage {
            server_message_type: ServerMessageType::Notification,
            game: None,
            message: Some(text.into()),
            error_message: None,
        }
    }

    pub fn error(err: &CommandError) -> Self {
        ServerMessage {
            server_message_type: ServerMessageType::Error,
            game: None,
            message: None,
            error_message: Some(format!("Error: {}", err)),
        }
    }
}

/// Board and turn as shown to clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    #[serde(rename = "gameID")]
    pub game_id: GameId,
    pub game_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub black_username: Option<String>,
    pub turn: Color,
    pub game_over: bool,
    pub status: String,
    /// Row 1 first; each row runs from column 1 to 8.
    pub board: Vec<Vec<Option<Piece>>>,
}

impl From<&MatchSession> for GameSnapshot {
    fn from(session: &MatchSession) -> Self {
        let game = &session.game;
        GameSnapshot {
            game_id: session.game_id,
            game_name: session.game_name.clone(),
            white_username: session.white_player.clone(),
            black_username: session.black_player.clone(),
            turn: game.turn(),
            game_over: game.is_over(),
            status: get_game_status(game),
            board: game.board().rows().iter().map(|row| row.to_vec()).collect(),
        }
    }
}

/// Serialized text pushed to a websocket actor for delivery
#[derive(Message)]
#[rtype(result = "()")]
pub struct ChessWebSocketMessage(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{PieceType, Position};

    #[test]
    fn parses_a_make_move_command() {
        let text = r#"{
            "commandType": "MAKE_MOVE",
            "authToken": "tok",
            "gameID": 7,
            "move": {"start": {"row": 7, "col": 1}, "end": {"row": 8, "col": 1}, "promotion": "QUEEN"}
        }"#;
        let command: UserGameCommand = serde_json::from_str(text).unwrap();
        assert_eq!(command.command_type, CommandType::MakeMove);
        assert_eq!(command.game_id, 7);
        assert_eq!(
            command.chess_move,
            Some(Move::with_promotion(Position::new(7, 1), Position::new(8, 1), PieceType::Queen))
        );
        assert_eq!(command.player_color, None);
    }

    #[test]
    fn parses_connect_with_a_color_request() {
        let text = r#"{"commandType":"CONNECT","authToken":"tok","gameID":1,"playerColor":"BLACK"}"#;
        let command: UserGameCommand = serde_json::from_str(text).unwrap();
        assert_eq!(command.command_type, CommandType::Connect);
        assert_eq!(command.player_color, Some(Color::Black));
        assert_eq!(command.chess_move, None);
    }

    #[test]
    fn error_message_omits_empty_fields() {
        let json = serde_json::to_value(ServerMessage::error(&CommandError::NotFound(3))).unwrap();
        assert_eq!(json["serverMessageType"], "ERROR");
        assert_eq!(json["errorMessage"], "Error: game 3 not found");
        assert!(json.get("game").is_none());
        assert!(json.get("message").is_none());
    }

    #[test]
    fn load_game_carries_the_board() {
        let mut session = MatchSession::new(4, "friendly");
        session.white_player = Some("alice".to_string());
        let json = serde_json::to_value(ServerMessage::load_game(&session)).unwrap();

        let game = &json["game"];
        assert_eq!(game["gameID"], 4);
        assert_eq!(game["turn"], "WHITE");
        assert_eq!(game["whiteUsername"], "alice");
        assert!(game.get("blackUsername").is_none());
        assert_eq!(game["board"][0][4]["type"], "KING");
        assert_eq!(game["board"][7][3]["color"], "BLACK");
        assert!(game["board"][3][3].is_null());
    }
}
