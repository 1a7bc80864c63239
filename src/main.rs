//! Binary entry point: CLI parsing, tracing init, and the axum server loop.

use clap::Parser;
use media_gateway::config::Config;
use media_gateway::web::{AppState, build_router};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "media-gateway", about = "Multi-upstream media gateway")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// Overrides the configured bind host.
    #[arg(long)]
    host: Option<String>,

    /// Overrides the configured bind port.
    #[arg(long)]
    port: Option<u16>,

    /// Tracing log level (e.g. `info`, `debug`, `media_gateway=debug`).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = Config::load_from_file(&cli.config)?;
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }

    let bind_addr = format!("{}:{}", config.web.host, config.web.port);
    let state = AppState::new(config);
    let router = build_router(state);

    tracing::info!(addr = %bind_addr, "starting media gateway");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
