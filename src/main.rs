use axum::Extension;
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::join;
use tokio::signal;

use crate::services::tokens::Tokens;
use crate::utils::signing::SigningKey;

mod config;
mod database;
mod http;
mod services;
mod utils;

/// The server version extracted from the Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    // Load environment variables from any .env file
    _ = dotenvy::dotenv();

    let config = config::load_config().unwrap_or_default();

    utils::logging::setup(config.logging);

    let (db, signing_key) = join!(database::init(), SigningKey::global());

    let tokens = Arc::new(Tokens::new(signing_key));

    let router = http::routes::router()
        .layer(Extension(db))
        .layer(Extension(tokens));

    let addr = SocketAddr::new(config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(value) => value,
        Err(err) => {
            error!("Failed to bind HTTP server on {}: {:?}", addr, err);
            return;
        }
    };

    info!("Starting server on {} (v{})", addr, VERSION);

    if let Err(err) = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            _ = signal::ctrl_c().await;
        })
        .await
    {
        error!("Error while running server: {:?}", err);
    }
}
