//! Countdown Server - A state-managed HTTP server hosting a countdown timer
//! 
//! This is the main entry point for the countdown-server application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use countdown_server::{
    api::create_router,
    clock::SystemClock,
    config::Config,
    state::AppState,
    tasks::countdown_ticker_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("countdown_server={},tower_http=info", config.log_level()))
        .init();

    info!("Starting countdown-server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, tick={}ms",
          config.host, config.port, config.tick_ms);

    // Create application state
    let mut state = AppState::new(config.port, config.host.clone(), Arc::new(SystemClock));
    if let Some(path) = config.preferences.clone() {
        info!("Persisting preferences to {}", path.display());
        state = state.with_preferences_file(path)?;
    }
    let state = Arc::new(state);

    // Start the countdown ticker background task
    let ticker_state = Arc::clone(&state);
    let period = config.tick_period();
    tokio::spawn(async move {
        countdown_ticker_task(ticker_state, period).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /countdown/start  - Start a duration or end-time countdown");
    info!("  POST /countdown/pause  - Toggle pause/resume");
    info!("  POST /countdown/reset  - Reset the countdown");
    info!("  GET  /countdown        - Current remaining time");
    info!("  GET  /countdown/events - Server-sent snapshots and completion");
    info!("  GET  /preferences      - Display preferences (PUT to update)");
    info!("  GET  /status           - Countdown and server status");
    info!("  GET  /health           - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
