//! Real-time chess matches over websockets: a rules engine that owns the
//! board, and a coordinator that serializes player commands per game and fans
//! the results out to every connection watching it.

pub mod config;
pub mod error;
pub mod game;
pub mod models;
pub mod routes;
pub mod store;
pub mod websocket;
