use satvis_backend::config;
use satvis_backend::model::sat::{
    SatelliteManager, SatnogsTransmitterFetcher, start_satellite_updater,
};
use satvis_backend::module::visibility::VisibilityCalculator;
use satvis_backend::service::{self, AppState};

use anyhow::Result;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::read_config()?;

    // Initialize logging
    let _logging_guard =
        satvis_backend::logging::init_logging(&config.log_dir, "satvis-backend", &config.log_level)?;

    tracing::info!("Satvis Backend starting...");
    tracing::info!("Server will listen on {}", config.server_address());

    // Serve from the cached catalog; refreshes run in the background
    let satellite_manager = SatelliteManager::new(&config.cache_dir, config.sources.clone())?;
    satellite_manager.initialize().await?;
    tracing::info!(
        "Satellite manager initialized with {} satellites",
        satellite_manager.satellite_count().await
    );

    let transmitter_fetcher = Arc::new(SatnogsTransmitterFetcher::new(&config.transmitter_api_url)?);
    let _updater = start_satellite_updater(
        satellite_manager.clone(),
        transmitter_fetcher,
        config.update_intervals(),
        config.perform_initial_update,
    );

    let state = AppState::new(
        satellite_manager,
        VisibilityCalculator::new(config.search_config()),
        config.pass_query(),
    );
    let app = service::router(state);

    let listener = tokio::net::TcpListener::bind(config.server_address()).await?;
    tracing::info!("HTTP server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
