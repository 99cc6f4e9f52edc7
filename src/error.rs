// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Error types shared across the crate

use thiserror::Error;

/// Errors raised while resolving a tank or checking the values requested for it.
#[derive(Debug, Error)]
pub enum TankError {
    #[error("unknown tank '{0}', expected one of overhead1, overhead2, underground")]
    UnknownTank(String),

    #[error("{parameter} = {value} does not fit in two 16-bit registers (0..={max})")]
    OutOfRange {
        parameter: &'static str,
        value: i64,
        max: i64,
    },
}

/// Errors raised by a register store backend.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection failed: {0}")]
    Connection(String),

    #[error("cache command failed: {0}")]
    Command(#[from] redis::RedisError),

    #[error("cache did not answer within {0} ms")]
    Timeout(u64),
}

/// Errors raised while reading the device/register mapping store.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("mapping database error: {0}")]
    Database(#[from] sqlx::Error),
}
