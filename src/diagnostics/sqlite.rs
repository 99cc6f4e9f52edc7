// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Device registry backed by SQLite

use async_trait::async_trait;
use log::{debug, warn};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use super::{RegisterMapping, RegisterMappingSource};
use crate::error::MappingError;

const MAPPING_QUERY: &str = "SELECT d.slaveid, m.parameter_name, m.register_address \
     FROM iotdevices d \
     JOIN sensor_data_register_mapping m ON d.devices_type_id = m.devices_type_id";

/// Reads register names from the `iotdevices` and
/// `sensor_data_register_mapping` tables.
#[derive(Debug, Clone)]
pub struct SqliteMappingSource {
    pool: SqlitePool,
}

impl SqliteMappingSource {
    /// Open a pool on `database_url` without connecting yet, so a missing
    /// database only affects the diagnostics page.
    pub fn connect_lazy(database_url: &str) -> Result<Self, MappingError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_lazy(database_url)?;
        debug!("Device registry pool prepared for {}", database_url);
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegisterMappingSource for SqliteMappingSource {
    async fn mappings(&self) -> Result<Vec<RegisterMapping>, MappingError> {
        let rows: Vec<(i64, String, i64)> = sqlx::query_as(MAPPING_QUERY)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!("Error querying register mapping: {}", e);
                MappingError::from(e)
            })?;
        Ok(rows
            .into_iter()
            .map(|(device_id, parameter, register)| {
                RegisterMapping::new(device_id, parameter, register)
            })
            .collect())
    }
}
