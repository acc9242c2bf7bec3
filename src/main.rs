use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fleetmon::api::{self, AppState};
use fleetmon::config::{Config, LoggingConfig};
use fleetmon::manifest;
use fleetmon::state::DeviceRegistry;

#[derive(Parser, Debug)]
#[command(name = "fleetmon")]
#[command(version)]
#[command(about = "fleetmon - device heartbeat and upload-time telemetry service", long_about = None)]
struct Args {
    /// Path to configuration file (default: ./fleetmon.toml, then ~/.config/fleetmon/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides config)
    #[arg(long, env = "FLEETMON_HOST")]
    host: Option<String>,

    /// Bind port (overrides config)
    #[arg(short, long, env = "FLEETMON_PORT")]
    port: Option<u16>,

    /// Device manifest file (overrides config)
    #[arg(short, long, env = "FLEETMON_DEVICES_FILE")]
    devices: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (overrides config)
    #[arg(long, env = "FLEETMON_LOG_LEVEL")]
    log_level: Option<String>,

    /// Shorthand for --log-level debug
    #[arg(long)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    /// Layer CLI and environment overrides on top of the loaded config
    fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(devices) = self.devices {
            config.devices.manifest_path = devices;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if self.debug {
            config.logging.level = "debug".to_string();
        }
        if self.json_logs {
            config.logging.json = true;
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load_or_default(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    init_tracing(&config.logging);
    info!(
        host = %config.server.host,
        port = config.server.port,
        uptime_formula = ?config.stats.uptime_formula,
        "Loaded configuration"
    );

    let device_ids = match manifest::load_manifest(&config.devices.manifest_path) {
        Ok(ids) => ids,
        Err(err) => {
            error!(error = ?err, "Error reading devices file");
            return Err(err);
        }
    };

    let registry = DeviceRegistry::with_uptime_formula(config.stats.uptime_formula);
    for device_id in device_ids {
        registry.register(device_id);
    }
    info!(devices = registry.len(), "Device registry populated");

    let addr = config.socket_addr()?;
    let app = api::build_app(AppState::new(registry, config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!(%addr, "API started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("fleetmon exiting");
    Ok(())
}

/// Resolve on SIGINT (Ctrl-C) or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
