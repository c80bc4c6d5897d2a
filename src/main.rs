use actix_web::{web, App, HttpServer};
use log::info;
use std::io;
use std::sync::Arc;

use chess_match_server::config::ServerConfig;
use chess_match_server::models::AppState;
use chess_match_server::routes::configure_routes;
use chess_match_server::store::{MemoryIdentityStore, MemoryMatchStore};
use chess_match_server::websocket::MatchCoordinator;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config_path = ServerConfig::path_from_env();
    let config = ServerConfig::load_or_default(&config_path)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let identities = Arc::new(MemoryIdentityStore::new());
    let matches = Arc::new(MemoryMatchStore::new());
    config
        .seed(&identities, &matches)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    // Create shared application state
    let app_state = web::Data::new(AppState {
        coordinator: MatchCoordinator::new(identities, matches),
    });

    info!("Starting chess match server at http://{}", config.bind_address);

    let static_dir = config.static_dir.clone();
    HttpServer::new(move || {
        let static_dir = static_dir.clone();
        App::new()
            .app_data(app_state.clone())
            .configure(move |cfg| configure_routes(cfg, &static_dir))
    })
    .bind(&config.bind_address)?
    .run()
    .await
}
