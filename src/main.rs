//! Lights Out - a state-managed watchdog that shuts down an empty game server
//!
//! This is the main entry point for the lights-out daemon.

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;

use lights_out::{
    config::Config,
    services::CommandShutdown,
    state::{AppState, PlayerRoster},
    tasks::{countdown_ticker_task, event_dispatcher_task},
    timer::IdleTimer,
    api::create_router,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(Config::parse());

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("lights_out={},tower_http=info", config.log_level()))
        .init();

    info!("Starting lights-out v1.2.0");
    info!(
        "Configuration: host={}, port={}, delay={}min, settle={}s",
        config.host, config.port, config.delay, config.settle_secs
    );

    // Validate the shutdown command before anything can ever fire it
    let shutdown = match CommandShutdown::from_command_line(&config.shutdown_command) {
        Ok(command) => Arc::new(command),
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    // Wire the timer to its collaborators
    let roster = Arc::new(PlayerRoster::new());
    let timer = IdleTimer::new(roster.clone(), config.clone(), shutdown);
    let monitor = timer.clone();

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let state = Arc::new(AppState::new(
        roster,
        timer.clone(),
        event_tx.clone(),
        config.host.clone(),
        config.port,
        config.delay,
    ));

    // Start the background tasks: the dispatcher owns event ordering, the
    // ticker only feeds countdown logging
    tokio::spawn(event_dispatcher_task(timer, event_rx, !config.single_user));
    tokio::spawn(countdown_ticker_task(event_tx));

    // The daemon coming up counts as the session starting; the settle check
    // covers a server that is already empty
    state.session_start();

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /session/start - Reset the idle monitor for a new session");
    info!("  POST /session/stop  - Cancel pending shutdown, stop monitoring");
    info!("  POST /players/join  - Report a player joining");
    info!("  POST /players/leave - Report a player leaving");
    info!("  GET  /status        - Check current status and timer");
    info!("  GET  /health        - Health check");

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

    // Tear down synchronously so no scheduled fire outlives the daemon
    monitor.on_session_stop();

    info!("Server shutdown complete");
    Ok(())
}
