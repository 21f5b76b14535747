//! Chat Relay Server - Entry Point
//!
//! A line-oriented TCP chat relay. Every connection negotiates a unique
//! display name, then each line it sends is fanned out to all other
//! connected clients.

use log::{error, info};

use chat_relay_server::Server;
use chat_relay_server::config::ServerConfig;
use chat_relay_server::error::ChatServerError;

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    info!("Launching chat relay server...");

    if let Err(e) = run().await {
        error!("Server failed to start: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ChatServerError> {
    let config = ServerConfig::load()?;
    let server = Server::new(config).await?;
    server.start().await;
    Ok(())
}
