use actix::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{CommandError, TransportError};
use crate::models::{AppState, ChessWebSocketMessage, CommandType, GameId, ServerMessage, UserGameCommand};
use crate::websocket::registry::{ClientHandle, Transport};

/// WebSocket handler for one client connection
pub struct ChessWebSocket {
    pub id: String,
    pub app_state: web::Data<AppState>,
    /// The game this connection is registered with, once CONNECT succeeded.
    pub game_id: Option<GameId>,
}

impl Transport for Addr<ChessWebSocket> {
    fn send(&self, text: &str) -> Result<(), TransportError> {
        if !self.connected() {
            return Err(TransportError::Closed);
        }
        self.do_send(ChessWebSocketMessage(text.to_string()));
        Ok(())
    }
}

impl Actor for ChessWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, _: &mut Self::Context) {
        info!("WebSocket connection started: {}", self.id);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.release();
        info!("WebSocket connection closed: {}", self.id);
        Running::Stop
    }
}

impl Handler<ChessWebSocketMessage> for ChessWebSocket {
    type Result = ();

    fn handle(&mut self, msg: ChessWebSocketMessage, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

// WebSocket message handler
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChessWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => {
                let handle = self.client_handle(ctx);
                self.on_text(&text, &handle);
            }
            Ok(ws::Message::Binary(_)) => {
                let handle = self.client_handle(ctx);
                self.on_binary(&handle);
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => {
                warn!("WebSocket protocol error on {}: {}", self.id, e);
                ctx.stop();
            }
        }
    }
}

impl ChessWebSocket {
    pub fn new(app_state: web::Data<AppState>) -> Self {
        ChessWebSocket {
            id: Uuid::new_v4().to_string(),
            app_state,
            game_id: None,
        }
    }

    fn client_handle(&self, ctx: &mut ws::WebsocketContext<Self>) -> ClientHandle {
        ClientHandle::new(self.id.clone(), Arc::new(ctx.address()))
    }

    /// One text frame: a command, or a directed BadRequest when it does not
    /// parse. The connection stays open either way.
    fn on_text(&mut self, text: &str, handle: &ClientHandle) {
        info!("Received text message on {}: {}", self.id, text);
        match serde_json::from_str::<UserGameCommand>(text) {
            Ok(command) => self.handle_command(command, handle),
            Err(e) => {
                warn!("Error parsing client message: {}", e);
                self.reply_error(handle, &CommandError::BadRequest(format!("invalid message format: {}", e)));
            }
        }
    }

    fn on_binary(&self, handle: &ClientHandle) {
        warn!("Binary messages are not supported");
        self.reply_error(handle, &CommandError::BadRequest("binary messages are not supported".to_string()));
    }

    /// Transport gone: unregister from the current game. Seats are kept.
    fn release(&mut self) {
        if let Some(game_id) = self.game_id.take() {
            self.app_state.coordinator.disconnect(game_id, &self.id);
        }
    }

    fn handle_command(&mut self, command: UserGameCommand, handle: &ClientHandle) {
        let game_id = command.game_id;
        let command_type = command.command_type;
        let coordinator = &self.app_state.coordinator;

        if coordinator.handle(handle, command).is_err() {
            return;
        }

        match command_type {
            CommandType::Connect => {
                // One game per connection; switching games drops the old registration.
                if let Some(previous) = self.game_id.replace(game_id) {
                    if previous != game_id {
                        coordinator.disconnect(previous, &self.id);
                    }
                }
            }
            CommandType::Leave => {
                if self.game_id == Some(game_id) {
                    self.game_id = None;
                }
            }
            CommandType::MakeMove | CommandType::Resign => {}
        }
    }

    fn reply_error(&self, handle: &ClientHandle, err: &CommandError) {
        let text = match serde_json::to_string(&ServerMessage::error(err)) {
            Ok(text) => text,
            Err(e) => {
                warn!("Error serializing message: {}", e);
                return;
            }
        };
        if let Err(e) = handle.send_text(&text) {
            warn!("Could not send error to {}: {}", self.id, e);
        }
    }
}

/// WebSocket connection handler
pub async fn ws_index(req: HttpRequest, stream: web::Payload, app_state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let ws = ChessWebSocket::new(app_state.clone());
    info!("New WebSocket connection: {}", ws.id);
    ws::start(ws, &req, stream)
}
