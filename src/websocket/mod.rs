pub mod game_handlers;
pub mod handler;
pub mod registry;

pub use game_handlers::MatchCoordinator;
pub use handler::{ws_index, ChessWebSocket};
pub use registry::{ClientHandle, ConnectionRegistry, Transport};
