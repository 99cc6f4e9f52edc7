// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Register cache configuration
//!
//! Settings for the key-value store shared with the Modbus process and for
//! the write confirmation handshake.

use serde::{Deserialize, Serialize};

/// Configuration of the register cache.
///
/// # Example
///
/// ```
/// use rust_tanklevel::config::CacheConfig;
///
/// let cache = CacheConfig {
///     url: "redis://redis:6379".to_string(),
///     ..CacheConfig::default()
/// };
/// assert_eq!(cache.confirmation_timeout_ms, 15_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Store URL: `redis://host:port[/db]`, `rediss://...`, or `memory://`
    /// for an in-process store (no Modbus process attached).
    #[serde(default = "default_url")]
    pub url: String,

    /// Key written by the liveness probe before every parameter operation.
    #[serde(default = "default_health_check_key")]
    pub health_check_key: String,

    /// Upper bound for connecting and for each store command, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Delay between two confirmation scans, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long a status check waits for write confirmations, in milliseconds.
    #[serde(default = "default_confirmation_timeout_ms")]
    pub confirmation_timeout_ms: u64,

    /// Interval of the daemon's cache liveness log, in seconds.
    #[serde(default = "default_heartbeat_interval_s")]
    pub heartbeat_interval_s: u64,
}

fn default_url() -> String {
    "redis://redis:6379".to_string()
}

fn default_health_check_key() -> String {
    crate::cache::DEFAULT_HEALTH_CHECK_KEY.to_string()
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_confirmation_timeout_ms() -> u64 {
    15_000
}

fn default_heartbeat_interval_s() -> u64 {
    60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            health_check_key: default_health_check_key(),
            timeout_ms: default_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            confirmation_timeout_ms: default_confirmation_timeout_ms(),
            heartbeat_interval_s: default_heartbeat_interval_s(),
        }
    }
}
