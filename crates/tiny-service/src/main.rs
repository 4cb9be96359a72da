//! tiny-service
//!
//! - `GET /`        : service metadata
//! - `GET /healthz` : liveness / readiness probe
//! - `GET /greet`   : greeting, prefix from `WELCOME_PREFIX`
//! - `GET /metrics` : Prometheus exposition

use std::process::ExitCode;

use tiny_core::error::{Result, TinyError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiny_service::{app_state, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "tiny-service failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let state = app_state::AppState::new(config::load()?)?;
    let listen = state.cfg().listen_addr()?;

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| TinyError::Internal(format!("bind {listen} failed: {e}")))?;
    tracing::info!(%listen, welcome_prefix = %state.welcome_prefix(), "tiny-service starting");

    let app = router::build_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| TinyError::Internal(format!("server failed: {e}")))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
