use dashmap::DashMap;
use log::{debug, info, warn};
use std::sync::Arc;

use crate::error::TransportError;
use crate::models::{GameId, ServerMessage};

pub type ConnectionId = String;

/// Something that can deliver serialized text to one client.
pub trait Transport: Send + Sync {
    fn send(&self, text: &str) -> Result<(), TransportError>;
}

/// One live link: a stable id plus the means to reach it.
#[derive(Clone)]
pub struct ClientHandle {
    id: ConnectionId,
    transport: Arc<dyn Transport>,
}

impl ClientHandle {
    pub fn new(id: impl Into<ConnectionId>, transport: Arc<dyn Transport>) -> Self {
        ClientHandle {
            id: id.into(),
            transport,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn send_text(&self, text: &str) -> Result<(), TransportError> {
        self.transport.send(text)
    }
}

/// Live connections grouped by game. Safe to mutate from any number of
/// connection threads while a broadcast is in flight.
#[derive(Default)]
pub struct ConnectionRegistry {
    games: DashMap<GameId, Vec<ClientHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handle` as watching `game_id`. Re-adding the same connection
    /// replaces its earlier entry.
    pub fn add(&self, game_id: GameId, handle: ClientHandle, identity: &str) {
        let mut connections = self.games.entry(game_id).or_default();
        connections.retain(|conn| conn.id != handle.id);
        info!("Connection {} ({}) added to game {}", handle.id, identity, game_id);
        connections.push(handle);
    }

    /// Returns whether the connection was registered.
    pub fn remove(&self, game_id: GameId, connection_id: &str) -> bool {
        let removed = match self.games.get_mut(&game_id) {
            Some(mut connections) => {
                let before = connections.len();
                connections.retain(|conn| conn.id != connection_id);
                before != connections.len()
            }
            None => false,
        };
        self.games.remove_if(&game_id, |_, connections| connections.is_empty());
        if removed {
            info!("Connection {} removed from game {}", connection_id, game_id);
        }
        removed
    }

    pub fn contains(&self, game_id: GameId, connection_id: &str) -> bool {
        self.games
            .get(&game_id)
            .map_or(false, |connections| connections.iter().any(|conn| conn.id == connection_id))
    }

    pub fn connection_count(&self, game_id: GameId) -> usize {
        self.games.get(&game_id).map_or(0, |connections| connections.len())
    }

    /// Sends `message` to every connection on `game_id` except `exclude`.
    /// Connections that fail are dropped and the rest still get the message.
    /// Returns how many deliveries succeeded.
    pub fn broadcast(&self, game_id: GameId, message: &ServerMessage, exclude: Option<&str>) -> usize {
        let recipients: Vec<ClientHandle> = match self.games.get(&game_id) {
            Some(connections) => connections
                .iter()
                .filter(|conn| Some(conn.id.as_str()) != exclude)
                .cloned()
                .collect(),
            None => {
                debug!("No connections found for game {}", game_id);
                return 0;
            }
        };

        let Some(text) = encode(message) else {
            return 0;
        };

        let mut delivered = 0;
        let mut failed = Vec::new();
        for handle in &recipients {
            match handle.send_text(&text) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("Dropping connection {} from game {}: {}", handle.id, game_id, e);
                    failed.push(handle.id.clone());
                }
            }
        }
        for connection_id in failed {
            self.remove(game_id, &connection_id);
        }

        debug!(
            "Broadcast {:?} to {}/{} connections of game {}",
            message.server_message_type,
            delivered,
            recipients.len(),
            game_id
        );
        delivered
    }

    /// Sends `message` to a single connection. A failed send unregisters it
    /// from `game_id`.
    pub fn send_to(&self, game_id: GameId, handle: &ClientHandle, message: &ServerMessage) -> bool {
        let Some(text) = encode(message) else {
            return false;
        };
        match handle.send_text(&text) {
            Ok(()) => true,
            Err(e) => {
                warn!("Direct send to connection {} failed: {}", handle.id, e);
                self.remove(game_id, &handle.id);
                false
            }
        }
    }
}

fn encode(message: &ServerMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!("Error serializing message: {}", e);
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::thread;

    /// Keeps everything it is sent; can be told to start failing.
    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        pub(crate) sent: Mutex<Vec<ServerMessage>>,
        pub(crate) closed: AtomicBool,
    }

    impl RecordingTransport {
        pub(crate) fn messages(&self) -> Vec<ServerMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Transport for RecordingTransport {
        fn send(&self, text: &str) -> Result<(), TransportError> {
            if self.closed.load(Ordering::SeqCst) {
                return Err(TransportError::Closed);
            }
            self.sent.lock().unwrap().push(serde_json::from_str(text).unwrap());
            Ok(())
        }
    }

    fn client(id: &str) -> (ClientHandle, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        (ClientHandle::new(id, transport.clone()), transport)
    }

    #[test]
    fn broadcast_skips_the_excluded_connection() {
        let registry = ConnectionRegistry::new();
        let (a, a_out) = client("a");
        let (b, b_out) = client("b");
        registry.add(1, a, "alice");
        registry.add(1, b, "bob");

        let delivered = registry.broadcast(1, &ServerMessage::notification("hi"), Some("a"));

        assert_eq!(delivered, 1);
        assert!(a_out.messages().is_empty());
        assert_eq!(b_out.messages(), vec![ServerMessage::notification("hi")]);
    }

    #[test]
    fn failing_connection_is_dropped_and_others_still_receive() {
        let registry = ConnectionRegistry::new();
        let (a, a_out) = client("a");
        let (b, b_out) = client("b");
        let (c, c_out) = client("c");
        registry.add(1, a, "alice");
        registry.add(1, b, "bob");
        registry.add(1, c, "carol");
        b_out.closed.store(true, Ordering::SeqCst);

        let delivered = registry.broadcast(1, &ServerMessage::notification("move"), None);

        assert_eq!(delivered, 2);
        assert_eq!(a_out.messages().len(), 1);
        assert_eq!(c_out.messages().len(), 1);
        assert!(!registry.contains(1, "b"));
        assert!(registry.contains(1, "a") && registry.contains(1, "c"));
        assert_eq!(registry.connection_count(1), 2);
    }

    #[test]
    fn games_are_isolated() {
        let registry = ConnectionRegistry::new();
        let (a, a_out) = client("a");
        let (b, b_out) = client("b");
        registry.add(1, a, "alice");
        registry.add(2, b, "bob");

        registry.broadcast(2, &ServerMessage::notification("only two"), None);

        assert!(a_out.messages().is_empty());
        assert_eq!(b_out.messages().len(), 1);
        assert_eq!(registry.broadcast(3, &ServerMessage::notification("nobody"), None), 0);
    }

    #[test]
    fn removing_last_connection_forgets_the_game() {
        let registry = ConnectionRegistry::new();
        let (a, _) = client("a");
        registry.add(5, a.clone(), "alice");
        registry.add(5, a, "alice");
        assert_eq!(registry.connection_count(5), 1);

        assert!(registry.remove(5, "a"));
        assert!(!registry.remove(5, "a"));
        assert_eq!(registry.connection_count(5), 0);
        assert!(registry.games.get(&5).is_none());
    }

    #[test]
    fn direct_send_failure_unregisters() {
        let registry = ConnectionRegistry::new();
        let (a, a_out) = client("a");
        registry.add(1, a.clone(), "alice");

        assert!(registry.send_to(1, &a, &ServerMessage::notification("hello")));
        a_out.closed.store(true, Ordering::SeqCst);
        assert!(!registry.send_to(1, &a, &ServerMessage::notification("again")));
        assert!(!registry.contains(1, "a"));
    }

    #[test]
    fn concurrent_adds_removes_and_broadcasts() {
        let registry = Arc::new(ConnectionRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for i in 0..50 {
                        let id = format!("{}-{}", worker, i);
                        let (handle, _) = client(&id);
                        registry.add(1, handle, "someone");
                        registry.broadcast(1, &ServerMessage::notification("tick"), None);
                        if i % 2 == 0 {
                            registry.remove(1, &id);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.connection_count(1), 8 * 25);
    }
}
