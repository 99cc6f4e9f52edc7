// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use anyhow::{Context, Result};
use base64::Engine;
use log::debug;

use super::{Config, CONFIG_SCHEMA};

/// Cache URL schemes the service knows how to open.
const CACHE_SCHEMES: [&str; 4] = ["redis://", "rediss://", "redis+unix://", "memory://"];

/// Output the embedded JSON schema to the console.
///
/// This function is called when the `--show-config-schema` flag is provided
/// on the command line.
///
/// # Example
///
/// ```bash
/// ./rust_tanklevel --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;
    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;
    println!("{}", formatted_schema);
    Ok(())
}

/// Check if a string is a valid IP address
///
/// Rocket binds to a literal IPv4 or IPv6 address only, so host names such
/// as "localhost" are rejected.
pub fn is_valid_ip_address(addr: &str) -> bool {
    addr.parse::<std::net::IpAddr>().is_ok()
}

/// Validates the configuration against additional rules that aren't covered by the JSON schema.
///
/// # Validation Rules
///
/// - **SSL Configuration**: a certificate requires a key and vice versa, both valid base64
/// - **Port Range**: the web server port is within 1-65534
/// - **IP Address Format**: the bind address is a literal IP address
/// - **Cache URL**: uses a supported scheme
/// - **Confirmation timing**: the poll interval is non-zero and not longer than the timeout
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    if let Some(cert) = &config.visualization.cert {
        if config.visualization.key.is_none() {
            anyhow::bail!("SSL certificate provided without a key");
        }
        let _ = base64::engine::general_purpose::STANDARD
            .decode(cert)
            .context("SSL certificate is not valid base64")?;
    }

    if let Some(key) = &config.visualization.key {
        if config.visualization.cert.is_none() {
            anyhow::bail!("SSL key provided without a certificate");
        }
        let _ = base64::engine::general_purpose::STANDARD
            .decode(key)
            .context("SSL key is not valid base64")?;
    }

    if config.visualization.port < 1 || config.visualization.port > 65534 {
        anyhow::bail!("Invalid port number: {}", config.visualization.port);
    }

    if !is_valid_ip_address(&config.visualization.address) {
        anyhow::bail!(
            "Invalid bind address '{}', expected an IPv4 or IPv6 address",
            config.visualization.address
        );
    }

    if !CACHE_SCHEMES
        .iter()
        .any(|scheme| config.cache.url.starts_with(scheme))
    {
        anyhow::bail!(
            "Unsupported cache URL '{}', expected one of {}",
            config.cache.url,
            CACHE_SCHEMES.join(", ")
        );
    }

    if config.cache.poll_interval_ms == 0 {
        anyhow::bail!("cache.poll_interval_ms must be greater than 0");
    }
    if config.cache.poll_interval_ms > config.cache.confirmation_timeout_ms {
        anyhow::bail!(
            "cache.poll_interval_ms ({}) exceeds cache.confirmation_timeout_ms ({})",
            config.cache.poll_interval_ms,
            config.cache.confirmation_timeout_ms
        );
    }

    if !config.registry.database_url.starts_with("sqlite:") {
        anyhow::bail!(
            "Unsupported registry database URL '{}', expected sqlite:",
            config.registry.database_url
        );
    }

    Ok(())
}
