// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the tank level web service
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use rust_tanklevel::config::{output_config_schema, Config};
use rust_tanklevel::daemon::Daemon;

/// Liquid level tank monitor: live readings and calibration over the Modbus register cache
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (created with defaults if missing)
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Web server port, overrides the configuration file
    #[arg(short = 'p', long)]
    web_port: Option<u16>,

    /// Web server address, overrides the configuration file
    #[arg(short, long)]
    web_address: Option<String>,

    /// Register cache URL (redis://host:port or memory://), overrides the configuration file
    #[arg(long)]
    cache_url: Option<String>,

    /// Print the configuration JSON schema and exit
    #[arg(long)]
    show_config_schema: bool,
}

#[rocket::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.show_config_schema {
        return output_config_schema();
    }

    let mut config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    config.apply_args(args.web_port, args.web_address, args.cache_url);
    config
        .validate()
        .context("Invalid configuration after command line overrides")?;

    let mut daemon = Daemon::new();
    daemon.launch(&config).await?;
    info!("Tank level service started, press Ctrl+C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    daemon.shutdown();
    daemon.join().await?;
    Ok(())
}
