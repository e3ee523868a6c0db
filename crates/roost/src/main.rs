//! The roost daemon.
//!
//! Wires the pieces together: environment config, the lifecycle
//! supervisor driving a WebSocket connector, the status dashboard, and
//! POSIX signal handling. Configuration problems are fatal here, before
//! anything connects; once the supervisor is running, nothing makes the
//! process exit except a signal.

mod config;

use std::process::ExitCode;

use roost_client::WsConnector;
use roost_lifecycle::spawn_supervisor;
use tokio::net::TcpListener;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::RoostConfig;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match RoostConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration, refusing to start");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "startup failed");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the subscriber before anything can log. `RUST_LOG`
/// wins if set; `ROOST_LOG` supplies the default directive otherwise.
fn init_tracing() {
    let default = std::env::var("ROOST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

async fn run(config: RoostConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        identity = %config.identity,
        target = %config.server,
        probing = config.probe.is_some(),
        dashboard = %config.dashboard_addr,
        "roost starting"
    );

    // Everything that can fail is set up before the supervisor starts
    // dialing. After this block the only way out is a signal.
    let listener = TcpListener::bind(config.dashboard_addr).await?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let supervisor = spawn_supervisor(WsConnector, config.lifecycle())?;
    supervisor.start().await?;

    let app = roost_status::router(supervisor.subscribe(), config.identity.clone());
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let dashboard = tokio::spawn(roost_status::serve(listener, app, async move {
        let _ = shutdown_rx.await;
    }));

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    // Supervisor first: its teardown closes the live session. The
    // dashboard keeps answering until the very end.
    if let Err(e) = supervisor.stop().await {
        warn!(error = %e, "supervisor was already gone at shutdown");
    }
    let _ = shutdown_tx.send(());
    match dashboard.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "dashboard exited with an error"),
        Err(e) => warn!(error = %e, "dashboard task failed"),
    }

    info!("roost stopped");
    Ok(())
}
