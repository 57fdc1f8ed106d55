// Material Insights - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use material_insights::api::{build_router, AppState};
use material_insights::{logging, AppConfig, InsightsService, SqliteStore};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config = AppConfig::from_env();

    if !config.database_path.exists() {
        // Requests will answer 500 until the database appears
        warn!(path = ?config.database_path, "database not found; run `material-insights import-materials` first");
    }

    let store = SqliteStore::new(&config.database_path);
    let app = build_router(AppState::new(InsightsService::new(store)));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(%addr, db = ?config.database_path, "🚀 material insights server listening");

    axum::serve(listener, app)
        .await
        .context("Server exited with an error")?;

    Ok(())
}
