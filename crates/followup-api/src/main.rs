//! FUB Follow-up Assistant server entry point.
//!
//! Binary name: `fwup`
//!
//! Loads settings from the environment, wires the services, and runs the
//! REST API until Ctrl+C or SIGTERM.

mod http;
mod state;

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, Subcommand};

use followup_infra::config::Settings;
use state::AppState;

/// Interval between background sweeps of expired rate-limit rows and
/// cached lead contexts.
const PURGE_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Parser)]
#[command(name = "fwup", version, about = "Follow-up assistant backend for Follow Up Boss")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server.
    Serve {
        /// Bind host, overriding BIND_ADDR.
        #[arg(long)]
        host: Option<String>,
        /// Bind port, overriding BIND_ADDR.
        #[arg(long)]
        port: Option<u16>,
        /// Export spans through OpenTelemetry in addition to log output.
        #[arg(long)]
        otel: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port, otel } => serve(host, port, otel).await,
    }
}

async fn serve(host: Option<String>, port: Option<u16>, otel: bool) -> anyhow::Result<()> {
    followup_observe::tracing_setup::init_tracing(otel)
        .map_err(|e| anyhow::anyhow!("tracing init failed: {e}"))?;

    let settings = Settings::from_env()?;
    if settings.is_production() && !settings.frontend_embed_origin.starts_with("https://") {
        anyhow::bail!("FRONTEND_EMBED_ORIGIN must be https in production");
    }
    let state = AppState::init(settings).await?;

    let addr = bind_address(&state.settings.bind_addr, host.as_deref(), port)?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} Follow-up Assistant API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    spawn_purge_task(state.clone());

    let router = http::router::build_router(state);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    followup_observe::tracing_setup::shutdown_tracing();
    println!("\n  Server stopped.");
    Ok(())
}

/// Merge CLI overrides into the configured bind address.
fn bind_address(
    configured: &str,
    host_override: Option<&str>,
    port_override: Option<u16>,
) -> anyhow::Result<String> {
    let (host, port) = configured
        .rsplit_once(':')
        .ok_or_else(|| anyhow::anyhow!("BIND_ADDR '{configured}' is not host:port"))?;
    let host = host_override.unwrap_or(host);
    let port = match port_override {
        Some(p) => p,
        None => port
            .parse()
            .map_err(|_| anyhow::anyhow!("BIND_ADDR '{configured}' has a non-numeric port"))?,
    };
    Ok(format!("{host}:{port}"))
}

/// Periodically drop expired rate-limit rows and stale cached leads.
fn spawn_purge_task(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match state.rate_limiter.purge_expired().await {
                Ok(purged) if purged > 0 => {
                    tracing::debug!(purged, "dropped expired rate-limit entries");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "rate-limit purge failed"),
            }
            state.lead_cache.purge_expired();
        }
    });
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
