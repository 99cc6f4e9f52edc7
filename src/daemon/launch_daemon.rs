// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;

use crate::cache::CacheGateway;
use crate::config::{Config, VisualizationConfig};
use crate::diagnostics::{RegisterMappingSource, SqliteMappingSource};
use crate::visualization::server::build_rocket;
use base64::prelude::*;
use rocket::figment::Figment;
use rocket::{
    config::LogLevel,
    data::{Limits, ToByteUnit},
};

/// Granularity at which background loops notice a shutdown request.
const SHUTDOWN_POLL: Duration = Duration::from_millis(500);

/// Represents a daemon task that can be started and managed
pub struct Daemon {
    tasks: Vec<JoinHandle<Result<()>>>,
    running: Arc<AtomicBool>,
    shutdown: Option<rocket::Shutdown>,
}

impl Default for Daemon {
    fn default() -> Self {
        Self::new()
    }
}

impl Daemon {
    /// Create a new daemon instance
    pub fn new() -> Self {
        Daemon {
            tasks: Vec::new(),
            running: Arc::new(AtomicBool::new(true)),
            shutdown: None,
        }
    }

    /// Launch all configured tasks based on configuration
    pub async fn launch(&mut self, config: &Config) -> Result<()> {
        let gateway =
            CacheGateway::from_config(&config.cache).context("Failed to set up register cache")?;

        if gateway.ping().await {
            info!("Register cache ({}) reachable", gateway.backend());
        } else {
            warn!(
                "Register cache ({}) not reachable yet, readings will be empty",
                gateway.backend()
            );
        }

        // Start web server if enabled
        if config.visualization.enabled {
            let mappings: Arc<dyn RegisterMappingSource> = Arc::new(
                SqliteMappingSource::connect_lazy(&config.registry.database_url)
                    .context("Failed to prepare the device registry")?,
            );
            self.start_web_server(&config.visualization, gateway.clone(), mappings)
                .await?;
        }

        // Start heartbeat task for monitoring
        self.start_heartbeat(
            gateway,
            Duration::from_secs(config.cache.heartbeat_interval_s),
        )?;

        Ok(())
    }

    /// Start the Rocket web server
    async fn start_web_server(
        &mut self,
        config: &VisualizationConfig,
        gateway: CacheGateway,
        mappings: Arc<dyn RegisterMappingSource>,
    ) -> Result<()> {
        info!(
            "Starting web server on {}:{}",
            config.address, config.port
        );

        let figment = web_figment(config)?;
        let rocket = build_rocket(figment, gateway, mappings)?;
        let ignited = rocket.ignite().await?;
        self.shutdown = Some(ignited.shutdown());

        let task = tokio::spawn(async move {
            ignited.launch().await?;
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Start a heartbeat task that logs the cache liveness periodically
    fn start_heartbeat(&mut self, gateway: CacheGateway, interval: Duration) -> Result<()> {
        debug!("Starting heartbeat monitor every {:?}", interval);

        let running = self.running.clone();
        let task = tokio::spawn(async move {
            let mut was_alive = true;
            while running.load(Ordering::SeqCst) {
                let alive = gateway.ping().await;
                match (was_alive, alive) {
                    (true, false) => warn!("Register cache ({}) went down", gateway.backend()),
                    (false, true) => info!("Register cache ({}) is back", gateway.backend()),
                    _ => debug!("Daemon heartbeat: cache alive = {}", alive),
                }
                was_alive = alive;

                let mut waited = Duration::ZERO;
                while waited < interval && running.load(Ordering::SeqCst) {
                    time::sleep(SHUTDOWN_POLL).await;
                    waited += SHUTDOWN_POLL;
                }
            }
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Stop all running tasks
    pub fn shutdown(&self) {
        info!("Shutting down daemon tasks");
        self.running.store(false, Ordering::SeqCst);
        if let Some(shutdown) = &self.shutdown {
            shutdown.clone().notify();
        }
    }

    /// Wait for all tasks to complete
    pub async fn join(self) -> Result<()> {
        for task in self.tasks {
            match task.await {
                Ok(Err(e)) => log::error!("Task failed: {}", e),
                Err(e) => log::error!("Task panicked: {}", e),
                Ok(Ok(())) => {}
            }
        }
        Ok(())
    }
}

/// Rocket settings derived from the `visualization` section.
pub fn web_figment(config: &VisualizationConfig) -> Result<Figment> {
    let mut figment = rocket::Config::figment()
        .merge(("ident", config.name.clone()))
        .merge(("limits", Limits::new().limit("json", 1.mebibytes())))
        .merge(("address", config.address.clone()))
        .merge(("port", config.port))
        .merge(("log_level", LogLevel::Normal))
        // ctrl-c is handled by the daemon
        .merge(("shutdown.ctrlc", false));

    // Configure TLS if certificates are provided
    if let (Some(cert), Some(key)) = (&config.cert, &config.key) {
        debug!("SSL certificates found in configuration, enabling TLS");

        // Decode base64 certificates
        let cert_data = BASE64_STANDARD
            .decode(cert)
            .context("SSL certificate is not valid base64")?;
        let key_data = BASE64_STANDARD
            .decode(key)
            .context("SSL key is not valid base64")?;

        // Configure TLS
        figment = figment
            .merge(("tls.certs", cert_data))
            .merge(("tls.key", key_data));

        info!("TLS enabled for web server");
    }

    Ok(figment)
}
