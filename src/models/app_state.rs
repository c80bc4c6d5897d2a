use crate::websocket::MatchCoordinator;

/// Application state shared between connections
pub struct AppState {
    pub coordinator: MatchCoordinator,
}
