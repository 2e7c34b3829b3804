//! Toolroom Server - tool check-out / check-in inventory
//!
//! REST API server for tracking tools lent to workers and projects.

use anyhow::Context;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use toolroom_server::{
    api,
    config::AppConfig,
    repository::{seed, sqlite::SqliteStore, Repository},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("toolroom_server={},tower_http=debug", config.logging.level).into());

    let json = config.logging.format.eq_ignore_ascii_case("json");
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!("Starting Toolroom Server v{}", env!("CARGO_PKG_VERSION"));

    // Open the database and run migrations
    let store = SqliteStore::connect(&config.database)
        .await
        .context("Failed to open database")?;

    tracing::info!(url = %config.database.url, "Database ready");

    let repository = Repository::new(store);
    if config.database.seed_sample_data {
        seed::seed_sample_data(&repository)
            .await
            .context("Failed to insert sample data")?;
    }

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState::new(config, repository);
    let app = api::create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
