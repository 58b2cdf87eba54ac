mod config;
mod conversation;
mod errors;
mod gateway;
mod models;
mod reference;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::conversation::service::Conversation;
use crate::gateway::polling;
use crate::gateway::telegram::TelegramGateway;
use crate::reference::ReferenceFiles;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::JsonFileStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting careerbot v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(JsonFileStore::new(&config.database_path));
    info!("User store at {}", store.path().display());

    let references = Arc::new(ReferenceFiles {
        subject_rules: config.subject_rules_path.clone(),
        universities: config.universities_path.clone(),
        colleges: config.colleges_path.clone(),
    });
    info!("Reference tables: {references:?}");

    // All writes to the user document go through this one service
    let conversation = Arc::new(Conversation::new(
        store,
        references,
        config.payment_details.clone(),
    ));

    let telegram = Arc::new(TelegramGateway::new(
        &config.telegram_api_url,
        &config.telegram_token,
        config.poll_timeout_secs,
    )?);
    info!("Telegram gateway initialized");

    tokio::spawn(polling::run(
        telegram.clone(),
        conversation.clone(),
        config.poll_timeout_secs,
    ));

    let state = AppState {
        conversation,
        gateway: telegram,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
