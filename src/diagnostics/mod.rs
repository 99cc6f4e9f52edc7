// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Register diagnostics
//!
//! Joins the static device/register naming held by the device registry with
//! the live cache values, for the `/registers` page. Nothing is written.

pub mod sqlite;

use async_trait::async_trait;
use serde::Serialize;

use crate::cache::{keys, CacheGateway};
use crate::error::MappingError;

pub use sqlite::SqliteMappingSource;

/// One named register of one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterMapping {
    pub device_id: i64,
    pub parameter: String,
    pub register: i64,
}

impl RegisterMapping {
    pub fn new(device_id: i64, parameter: impl Into<String>, register: i64) -> Self {
        Self {
            device_id,
            parameter: parameter.into(),
            register,
        }
    }
}

/// Provider of the device/register naming.
#[async_trait]
pub trait RegisterMappingSource: Send + Sync {
    async fn mappings(&self) -> Result<Vec<RegisterMapping>, MappingError>;
}

/// Fixed mapping, for tests and for running without a registry database.
#[derive(Debug, Clone, Default)]
pub struct StaticMappingSource {
    mappings: Vec<RegisterMapping>,
}

impl StaticMappingSource {
    pub fn new(mappings: Vec<RegisterMapping>) -> Self {
        Self { mappings }
    }
}

#[async_trait]
impl RegisterMappingSource for StaticMappingSource {
    async fn mappings(&self) -> Result<Vec<RegisterMapping>, MappingError> {
        Ok(self.mappings.clone())
    }
}

/// A mapping row with its current cache value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRow {
    pub device_id: i64,
    pub parameter: String,
    pub register: i64,
    pub cache_key: String,
    /// `None` when the cache has no value (or is unreachable).
    pub cache_value: Option<String>,
}

/// Every mapped register with its live value, in mapping order.
pub async fn list_registers(
    gateway: &CacheGateway,
    source: &dyn RegisterMappingSource,
) -> Result<Vec<RegisterRow>, MappingError> {
    let mappings = source.mappings().await?;
    let mut rows = Vec::with_capacity(mappings.len());
    for mapping in mappings {
        let cache_key = keys::read_key(mapping.device_id, mapping.register);
        let cache_value = gateway.read_key(&cache_key).await;
        rows.push(RegisterRow {
            device_id: mapping.device_id,
            parameter: mapping.parameter,
            register: mapping.register,
            cache_key,
            cache_value,
        });
    }
    Ok(rows)
}
