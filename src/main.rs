use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imposter::{
    abuse::AbuseConfig, api, auth::CleanupConfig, catalog::CatalogConfig, config::ServerConfig,
    game::GameRules, janitor, state::AppState, store::StoreConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imposter=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Imposter...");

    let server_config = ServerConfig::from_env();
    let cleanup_config = Arc::new(CleanupConfig::from_env());
    let abuse_config = Arc::new(AbuseConfig::from_env());
    let rules = GameRules::from_env();

    let store = StoreConfig::from_env()?.build()?;

    let catalogs = CatalogConfig::from_env().build_catalogs()?;
    catalogs.warm_up().await;

    let state = Arc::new(AppState::new(store, catalogs, rules));

    // Spawn background task for deleting idle rooms
    janitor::spawn_room_janitor(state.clone(), cleanup_config.clone(), abuse_config.clone());

    let app = api::router(state, abuse_config, cleanup_config)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = server_config.socket_addr();
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
