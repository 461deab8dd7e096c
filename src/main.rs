//! Countdown Deck - a multi-timer countdown engine
//!
//! This is the main entry point for the countdown-deck server.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use countdown_deck::{
    api::create_router,
    config::Config,
    profile::ProfileStore,
    scheduler::Scheduler,
    state::AppState,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("countdown_deck={},tower_http=info", config.log_level()))
        .init();

    info!("Starting countdown-deck v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, tick={}ms, profile={}",
          config.host, config.port, config.tick_ms,
          config.profile.as_deref().unwrap_or("<last active>"));

    // Load the active profile, creating it on first run
    let store = ProfileStore::new(&config.profiles_dir)?;
    let profile = store.open_active(config.profile.as_deref())?;

    let scheduler = Arc::new(Scheduler::new(config.tick_interval()));
    let state = Arc::new(AppState::new(
        Arc::clone(&scheduler),
        store,
        profile,
        config.host.clone(),
        config.port,
    ));
    state.install_observers();

    // Start the tick loop
    scheduler.begin_loop();

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET    /timers              - List timers");
    info!("  POST   /timers              - Create a timer");
    info!("  GET    /timers/:id          - Show one timer");
    info!("  PATCH  /timers/:id          - Reconfigure a timer");
    info!("  DELETE /timers/:id          - Remove a timer");
    info!("  POST   /timers/:id/:action  - start | pause | reset | toggle");
    info!("  POST   /profile/save        - Save timers to the active profile");
    info!("  GET    /profiles            - List profiles");
    info!("  POST   /profiles/import     - Import a profile document");
    info!("  GET    /profiles/:name      - Export a profile document");
    info!("  DELETE /profiles/:name      - Delete a profile");
    info!("  POST   /profiles/:name/load - Switch the active profile");
    info!("  GET    /status              - Scheduler status");
    info!("  GET    /health              - Health check");

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

    scheduler.end_loop().await;

    if config.autosave {
        match state.save_profile() {
            Ok(count) => info!("Autosaved {} timers", count),
            Err(e) => tracing::error!("Autosave failed: {}", e),
        }
    }
    if let Err(e) = state.save_session() {
        tracing::error!("Failed to save session: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}
