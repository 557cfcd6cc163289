//! Warden Web Server
//!
//! Authenticated admin API gateway.

use anyhow::Context;
use clap::Parser;
use warden_core::{LogFormat, LoggingConfig, WardenConfig};
use warden_web::{init_logging, server::WardenServerBuilder, WebConfig};

/// Warden Web Server - bearer-token authentication for the admin API
#[derive(Parser)]
#[command(name = "warden-web")]
#[command(about = "Bearer-token authentication and grant-based authorization for the admin API")]
#[command(version)]
struct Args {
    /// TOML configuration file; environment variables are used when absent
    #[arg(short, long)]
    config: Option<String>,

    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Database URL
    #[arg(long)]
    database_url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    let (config, mut logging) = match &args.config {
        Some(path) => {
            let file = WardenConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path))?;
            file.validate().context("Invalid configuration")?;
            (WebConfig::from_warden_config(&file), file.logging)
        }
        None => (WebConfig::from_env(), LoggingConfig::default()),
    };

    if let Some(level) = args.log_level {
        logging.level = level;
    }
    if args.json_logs {
        logging.format = LogFormat::Json;
    }
    init_logging(&logging).map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    // Override with command line arguments
    let mut builder = WardenServerBuilder::with_config(config);
    if let Some(host) = args.host {
        builder = builder.host(host);
    }
    if let Some(port) = args.port {
        builder = builder.port(port);
    }
    if let Some(database_url) = args.database_url {
        builder = builder.database_url(database_url);
    }

    let server = builder.build().await.context("Failed to build server")?;
    server.start().await.context("Server error")?;

    Ok(())
}
