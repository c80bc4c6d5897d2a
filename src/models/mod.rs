pub mod app_state;
pub mod match_session;
pub mod messages;

// Re-export important types
pub use app_state::*;
pub use match_session::*;
pub use messages::*;
