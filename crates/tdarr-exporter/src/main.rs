//! tdarr-exporter
//!
//! - Poll `get-nodes` and `cruddb` every `POLLING_INTERVAL_SECONDS`
//! - Serve the registry on `0.0.0.0:EXPORTER_PORT`

use std::net::SocketAddr;
use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use tdarr_exporter::{app_state, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let cfg = match config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "config load failed");
            return ExitCode::FAILURE;
        }
    };
    let listen = SocketAddr::from(([0, 0, 0, 0], cfg.exporter_port));

    let state = match app_state::AppState::new(cfg) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        %listen,
        upstream = state.cfg().base_url(),
        interval_secs = state.cfg().polling_interval_seconds,
        "tdarr-exporter starting"
    );

    let listener = match tokio::net::TcpListener::bind(listen).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%listen, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tokio::spawn(state.scheduler().run());

    let app = router::build_router(state);
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
