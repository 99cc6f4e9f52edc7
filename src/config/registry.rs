// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Device registry configuration

use serde::{Deserialize, Serialize};

/// Location of the SQLite database describing devices and their register
/// names. Only the register diagnostics page reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// sqlx connection URL, e.g. `sqlite:///data/iot.db`.
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

fn default_database_url() -> String {
    "sqlite:///data/iot.db".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
        }
    }
}
