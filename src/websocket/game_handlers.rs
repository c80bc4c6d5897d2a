use dashmap::DashMap;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::CommandError;
use crate::game::utils::color_to_string;
use crate::game::{Color, Move};
use crate::models::{CommandType, GameId, MatchSession, MatchStatus, ServerMessage, UserGameCommand};
use crate::store::{IdentityResolver, MatchStore};
use crate::websocket::registry::{ClientHandle, ConnectionRegistry};

/// Runs player commands against match sessions and tells everyone watching.
///
/// All commands for one game run under that game's lock, from resolving the
/// session to the last notification, so two racing moves can never both be
/// applied against the same turn. Different games never contend.
pub struct MatchCoordinator {
    identities: Arc<dyn IdentityResolver>,
    store: Arc<dyn MatchStore>,
    registry: ConnectionRegistry,
    game_locks: DashMap<GameId, Arc<Mutex<()>>>,
}

impl MatchCoordinator {
    pub fn new(identities: Arc<dyn IdentityResolver>, store: Arc<dyn MatchStore>) -> Self {
        MatchCoordinator {
            identities,
            store,
            registry: ConnectionRegistry::new(),
            game_locks: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Processes one command from `origin`. A rejection is sent back to
    /// `origin` alone and also returned.
    pub fn handle(&self, origin: &ClientHandle, command: UserGameCommand) -> Result<(), CommandError> {
        let game_id = command.game_id;
        let command_type = command.command_type;
        let result = self.dispatch(origin, command);
        if let Err(err) = &result {
            warn!(
                "Rejected {:?} from connection {} on game {}: {}",
                command_type,
                origin.id(),
                game_id,
                err
            );
            self.reject(game_id, origin, err);
        }
        result
    }

    /// Sends a directed error to `origin`.
    pub fn reject(&self, game_id: GameId, origin: &ClientHandle, err: &CommandError) {
        self.registry.send_to(game_id, origin, &ServerMessage::error(err));
    }

    /// Transport closed: forget the connection, leave seats alone.
    pub fn disconnect(&self, game_id: GameId, connection_id: &str) {
        if self.registry.remove(game_id, connection_id) {
            info!("Connection {} disconnected from game {}", connection_id, game_id);
        }
    }

    /// Runs `f` while holding the lock for `game_id`. The lock entry is
    /// dropped again once no other command holds or awaits it.
    fn with_game_lock<T>(&self, game_id: GameId, f: impl FnOnce() -> T) -> T {
        let lock = self.game_locks.entry(game_id).or_default().clone();
        let result = {
            // The lock guards no data, only ordering, so a poisoned one is still usable.
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        drop(lock);
        // Clones are only taken under the shard lock, so a count of one here
        // means nobody else can be waiting on this entry.
        self.game_locks
            .remove_if(&game_id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    fn dispatch(&self, origin: &ClientHandle, command: UserGameCommand) -> Result<(), CommandError> {
        let identity = self.identities.resolve(&command.auth_token)?;
        self.with_game_lock(command.game_id, || self.run(origin, &identity, command))
    }

    fn run(&self, origin: &ClientHandle, identity: &str, command: UserGameCommand) -> Result<(), CommandError> {
        let session = self
            .store
            .get(command.game_id)?
            .ok_or(CommandError::NotFound(command.game_id))?;

        match command.command_type {
            CommandType::Connect => self.connect(origin, identity, session, command.player_color),
            CommandType::MakeMove => {
                let mv = command
                    .chess_move
                    .ok_or_else(|| CommandError::BadRequest("MAKE_MOVE requires a move".to_string()))?;
                self.make_move(origin, identity, session, mv)
            }
            CommandType::Leave => self.leave(origin, identity, session),
            CommandType::Resign => self.resign(identity, session),
        }
    }

    fn connect(
        &self,
        origin: &ClientHandle,
        identity: &str,
        mut session: MatchSession,
        preference: Option<Color>,
    ) -> Result<(), CommandError> {
        let game_id = session.game_id;
        let (seat, changed) = session.join(identity, preference)?;
        if changed {
            self.store.save(&session)?;
        }

        self.registry.add(game_id, origin.clone(), identity);
        self.registry.send_to(game_id, origin, &ServerMessage::load_game(&session));

        info!("{} joined game {} as {}", identity, game_id, seat);
        let notice = ServerMessage::notification(format!("{} joined as {}", identity, seat));
        self.registry.broadcast(game_id, &notice, Some(origin.id()));
        Ok(())
    }

    fn make_move(
        &self,
        origin: &ClientHandle,
        identity: &str,
        mut session: MatchSession,
        mv: Move,
    ) -> Result<(), CommandError> {
        if session.status() == MatchStatus::Over {
            return Err(CommandError::AlreadyOver);
        }
        let mover = session.game.turn();
        match session.color_of(identity) {
            Some(color) if color == mover => {}
            Some(_) => return Err(CommandError::Forbidden("it is not your turn".to_string())),
            None => return Err(CommandError::Forbidden("observers cannot make moves".to_string())),
        }

        session.game.make_move(mv)?;

        let opponent = mover.opponent();
        let outcome = if session.game.is_in_checkmate(opponent) {
            Some(format!(
                "{} is in checkmate, {} wins",
                display_name(&session, opponent),
                color_to_string(mover)
            ))
        } else if session.game.is_in_stalemate(opponent) {
            Some(format!("{} is in stalemate, the game is drawn", display_name(&session, opponent)))
        } else {
            None
        };
        if outcome.is_some() {
            session.game.end();
        }

        self.store.save(&session)?;

        let game_id = session.game_id;
        info!("{} moved {} in game {}", identity, mv, game_id);
        self.registry.broadcast(game_id, &ServerMessage::load_game(&session), None);
        let moved = ServerMessage::notification(format!("{} moved {}", identity, mv));
        self.registry.broadcast(game_id, &moved, Some(origin.id()));

        if let Some(text) = outcome {
            info!("Game {} over: {}", game_id, text);
            self.registry.broadcast(game_id, &ServerMessage::notification(text), None);
        } else if session.game.is_in_check(opponent) {
            let text = format!("{} is in check", display_name(&session, opponent));
            self.registry.broadcast(game_id, &ServerMessage::notification(text), None);
        }
        Ok(())
    }

    fn leave(&self, origin: &ClientHandle, identity: &str, mut session: MatchSession) -> Result<(), CommandError> {
        let game_id = session.game_id;
        let vacated = session.leave(identity);
        if let Some(seat) = vacated {
            self.store.save(&session)?;
            info!("{} vacated {} in game {}", identity, seat, game_id);
        }

        let unregistered = self.registry.remove(game_id, origin.id());
        if vacated.is_none() && !unregistered {
            debug!("{} left game {} without being part of it", identity, game_id);
            return Ok(());
        }
        let notice = ServerMessage::notification(format!("{} left the game", identity));
        self.registry.broadcast(game_id, &notice, None);
        Ok(())
    }

    fn resign(&self, identity: &str, mut session: MatchSession) -> Result<(), CommandError> {
        let Some(color) = session.color_of(identity) else {
            return Err(CommandError::Forbidden("observers cannot resign".to_string()));
        };
        if session.status() == MatchStatus::Over {
            return Err(CommandError::AlreadyOver);
        }

        session.game.end();
        self.store.save(&session)?;

        let game_id = session.game_id;
        info!("{} resigned game {}", identity, game_id);
        let notice = ServerMessage::notification(format!(
            "{} resigned, {} wins",
            identity,
            color_to_string(color.opponent())
        ));
        self.registry.broadcast(game_id, &notice, None);
        Ok(())
    }
}

/// The seated identity for `color`, or the color itself when the seat is empty.
fn display_name(session: &MatchSession, color: Color) -> String {
    session
        .player(color)
        .map(str::to_string)
        .unwrap_or_else(|| color.to_string())
}
